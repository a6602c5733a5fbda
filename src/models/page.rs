// Copyright 2025 coScene
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

/// One page of results with server-side paging metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub page: u32,
    pub page_size: u32,
    pub pages: u32,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    /// Build a page from the total number of matching records.
    ///
    /// `pages` is `ceil(total / page_size)`; a zero page size yields zero pages.
    pub fn from_total(page: u32, page_size: u32, total: u64, data: Vec<T>) -> Self {
        let pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(page_size))
        };
        Self {
            page,
            page_size,
            pages: u32::try_from(pages).unwrap_or(u32::MAX),
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            page: self.page,
            page_size: self.page_size,
            pages: self.pages,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

/// Result of a list operation.
///
/// Backends that report paging metadata return `Paginated`; the rest return
/// the plain sequence they received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
    Paginated(Paginated<T>),
    Items(Vec<T>),
}

impl<T> Listing<T> {
    pub fn items(&self) -> &[T] {
        match self {
            Listing::Paginated(page) => &page.data,
            Listing::Items(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Listing::Paginated(page) => page.data,
            Listing::Items(items) => items,
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn as_paginated(&self) -> Option<&Paginated<T>> {
        match self {
            Listing::Paginated(page) => Some(page),
            Listing::Items(_) => None,
        }
    }
}
