pub mod results_view;
pub mod session_panel;
pub mod upload_form;

pub use results_view::ResultsView;
pub use session_panel::SessionPanel;
pub use upload_form::UploadForm;
