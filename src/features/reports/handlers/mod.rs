pub mod report_handler;

pub use report_handler::{
    __path_add_photo, __path_create_report, __path_export_reports, __path_get_report,
    __path_list_reports, __path_list_user_reports, __path_remove_photo, __path_update_report,
    add_photo, create_report, export_reports, get_report, list_reports, list_user_reports,
    remove_photo, update_report,
};
