mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod memory;
    pub mod pagination;
    pub mod schema;
    pub mod store;
}
mod authentication {
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod constants;

mod cache {
    pub mod cache;
}

pub mod catalog {
    pub mod cached;
    pub mod meal;
    pub mod mealdb;
}

pub mod workflows {
    pub mod catalog;
    pub mod pantry;
    pub mod recipes;
}

pub mod config;
pub mod fetch;
pub mod generation;
pub mod llm;
pub mod matching;
pub mod routes;
pub mod state;
pub mod view;

#[cfg(test)]
mod test_support;

pub use authentication::*;
pub use cache::cache::*;
pub use constants::*;
pub use database::*;
