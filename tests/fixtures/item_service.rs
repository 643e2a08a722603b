use async_trait::async_trait;

use crate::model::{FileData, Item, ItemError};

pub struct Context {
    pub request_id: String,
}

#[async_trait]
pub trait ItemService {
    /// Lists items, at most `limit` of them.
    /// @http(op): GET /items
    /// @http(param): limit in=query
    async fn list_items(&self, ctx: &Context, limit: Option<i32>) -> Result<Vec<Item>, ItemError>;

    /// @http(op): GET /items/{id}
    /// @http(trace)
    async fn get_item(&self, ctx: &Context, id: u32) -> Result<Item, ItemError>;

    /// @http(op): DELETE /items/{id}
    async fn delete_item(&self, id: u32) -> Result<(), ItemError>;

    /// Stores a file under `file_name`.
    /// @http(op): POST /upload
    async fn upload(&self, file_name: String, file: FileData) -> Result<(), ItemError>;
}

/// Not annotated; only the trait above is generated.
pub trait Unrelated {
    fn noop(&self);
}
