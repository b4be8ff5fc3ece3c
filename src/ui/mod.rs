pub mod import_dialog;
pub mod tab_view;
pub mod tables;
