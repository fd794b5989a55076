#![allow(dead_code)]

use aws_lambda_events::encodings::Body;
use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use domain::{List, ListId, Task};
use handlers::{Constraints, HandlerContext};
use infrastructure::{entity_to_item, InMemoryGateway, TableGateway};
use serde_json::Value;
use shared::Config;
use std::sync::Arc;

pub const LIST_TABLE: &str = "List-test";
pub const TASKS_TABLE: &str = "Tasks-test";

/// テスト用の組み立て済みコンテキストとインメモリゲートウェイ
pub struct TestApp {
    pub ctx: Arc<HandlerContext>,
    pub gateway: Arc<InMemoryGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        let config = Config {
            list_table: LIST_TABLE.to_string(),
            tasks_table: TASKS_TABLE.to_string(),
            environment: "test".to_string(),
            aws_region: "ap-northeast-1".to_string(),
            dynamodb_endpoint: None,
        };
        let tables = infrastructure::Tables::from_config(&config);
        let gateway = Arc::new(InMemoryGateway::new(&tables));
        let constraints = Arc::new(Constraints::load().expect("constraints should load"));
        let ctx = HandlerContext::new(config, tables, gateway.clone(), constraints);

        Self {
            ctx: Arc::new(ctx),
            gateway,
        }
    }

    pub async fn seed_list(&self, id: &str, name: &str) -> List {
        let mut list = List::new(name).expect("valid list name");
        list.id = ListId::from_string(id).expect("valid list id");
        self.gateway
            .put_item(LIST_TABLE, entity_to_item(&list).expect("serializable list"))
            .await
            .expect("seed list");
        list
    }

    pub async fn seed_task(&self, id: &str, list_id: &str, description: &str) -> Task {
        let mut task = Task::new(
            ListId::from_string(list_id).expect("valid list id"),
            description,
        )
        .expect("valid description");
        task.id = domain::TaskId::from_string(id).expect("valid task id");
        self.gateway
            .put_item(TASKS_TABLE, entity_to_item(&task).expect("serializable task"))
            .await
            .expect("seed task");
        task
    }
}

pub fn request(body: &str) -> ApiGatewayProxyRequest {
    ApiGatewayProxyRequest {
        body: Some(body.to_string()),
        ..Default::default()
    }
}

pub fn empty_request() -> ApiGatewayProxyRequest {
    ApiGatewayProxyRequest::default()
}

/// ステータスコードとパース済みボディ
pub fn parts(response: &ApiGatewayProxyResponse) -> (i64, Value) {
    let body = match &response.body {
        Some(Body::Text(text)) => serde_json::from_str(text).expect("body should be JSON"),
        other => panic!("unexpected body: {other:?}"),
    };
    (response.status_code, body)
}
