mod state;
mod ui;

pub use state::{App, PageState, Section, SectionError};
pub use ui::{draw_ui, Presenter, TextPresenter};
