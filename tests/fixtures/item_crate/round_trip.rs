use std::sync::Mutex;

use async_trait::async_trait;

use crate::generated::http::new_http_router;
use crate::generated::http_client::{ClientError, HttpClient};
use crate::model::{FileData, Item, ItemError};
use crate::service::{Context, ItemService};

#[derive(Default)]
struct Store {
    items: Mutex<Vec<Item>>,
}

fn not_found(id: u32) -> ItemError {
    ItemError {
        code: 404,
        message: format!("item {} not found", id),
    }
}

#[async_trait]
impl ItemService for Store {
    async fn list_items(&self, _ctx: &Context, limit: Option<i32>) -> Result<Vec<Item>, ItemError> {
        let items = self.items.lock().unwrap().clone();
        Ok(match limit {
            Some(limit) => items.into_iter().take(limit.max(0) as usize).collect(),
            None => items,
        })
    }

    async fn get_item(&self, _ctx: &Context, id: u32) -> Result<Item, ItemError> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn delete_item(&self, id: u32) -> Result<(), ItemError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn upload(&self, file_name: String, file: FileData) -> Result<(), ItemError> {
        if file.size == 0 {
            return Err(ItemError {
                code: 422,
                message: format!("{} is empty", file_name),
            });
        }
        let mut items = self.items.lock().unwrap();
        let id = items.len() as u32 + 1;
        items.push(Item { id, name: file_name });
        Ok(())
    }
}

#[tokio::test]
async fn client_round_trips_through_router() {
    let store = Store {
        items: Mutex::new(vec![
            Item { id: 1, name: "one".to_string() },
            Item { id: 2, name: "two".to_string() },
        ]),
    };
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, new_http_router(store)).await.unwrap();
    });

    let client = HttpClient::new(reqwest::Client::new(), &format!("http://{}/", addr)).unwrap();

    assert_eq!(client.list_items(None).await.unwrap().len(), 2);
    assert_eq!(
        client.list_items(Some(1)).await.unwrap(),
        vec![Item { id: 1, name: "one".to_string() }]
    );
    assert_eq!(client.get_item(2).await.unwrap().name, "two");
    match client.get_item(9).await {
        Err(ClientError::Service(err)) => assert_eq!(err, not_found(9)),
        other => panic!("expected a service error, got {:?}", other),
    }

    client.upload("three.txt".to_string(), FileData { size: 3 }).await.unwrap();
    match client.upload("empty.txt".to_string(), FileData { size: 0 }).await {
        Err(ClientError::Service(err)) => assert_eq!(err.code, 422),
        other => panic!("expected a service error, got {:?}", other),
    }

    client.delete_item(1).await.unwrap();
    let names: Vec<String> = client
        .list_items(None)
        .await
        .unwrap()
        .into_iter()
        .map(|item| item.name)
        .collect();
    assert_eq!(names, vec!["two".to_string(), "three.txt".to_string()]);

    assert!(HttpClient::new(reqwest::Client::new(), "not a url").is_err());
}
