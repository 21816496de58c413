/*
 * This module provides the application logic layer: presenters that sit between
 * the core catalogue and whatever front-end displays it. `AppListController`
 * drives the installed-applications list and `AppDetailController` the detail
 * view. Both communicate with the front-end only through `ViewCommand`s.
 * Unit tests for `AppListController` are in `list_controller_tests.rs`.
 */
pub mod detail_controller;
pub mod list_controller;
pub mod view_commands;


pub use detail_controller::AppDetailController;
pub use list_controller::AppListController;
pub use view_commands::{MessageSeverity, ViewCommand};
