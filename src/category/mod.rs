//! Categories for expenses and incomes.

mod create;
mod db;
mod delete;
mod domain;
mod list;

pub use create::{create_category_endpoint, get_add_category_page};
pub use db::{
    count_categories, create_category, create_category_table, delete_category, get_all_categories,
    get_categories_by_kind, get_category, get_or_create_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{CATEGORY_NAME_MAX_LENGTH, Category, CategoryId, CategoryName};
pub use list::{
    create_category_from_list, get_categories_page, get_expense_categories_page,
    get_income_categories_page,
};
