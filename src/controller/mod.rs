pub mod form;
pub mod list;
pub mod pagination;

pub use form::{FormField, FormMode, ResourceForm, MASKED_PASSWORD};
pub use list::{
    DeleteTicket, LoadOutcome, LoadResult, LoadTicket, Phase, RemoveOutcome, ResourceListController,
};
pub use pagination::{PageView, Paginated};
