use aws_lambda_events::event::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use infrastructure::{DynamoDbGateway, Tables};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use shared::{create_lambda_span, init_tracing, Config, LambdaTraceContext};
use std::future::Future;
use std::sync::Arc;
use tracing::{info, Instrument};

use crate::constraints::Constraints;
use crate::context::HandlerContext;

/// 設定・制約スキーマ・DynamoDBクライアントを組み立てる
pub async fn build_context() -> Result<HandlerContext, Error> {
    let config = Config::from_env()?;
    let constraints = Arc::new(Constraints::load()?);
    let tables = Tables::from_config(&config);
    // SDK クライアントは状態を持たないため、全呼び出しで共有する
    let gateway = Arc::new(DynamoDbGateway::new(&config, &tables).await);

    info!(
        environment = %config.environment,
        list_table = %config.list_table,
        tasks_table = %config.tasks_table,
        "ハンドラーを初期化しました"
    );

    Ok(HandlerContext::new(config, tables, gateway, constraints))
}

/// 1操作分の Lambda 関数を起動する
pub async fn serve<F, Fut>(operation: &'static str, handler: F) -> Result<(), Error>
where
    F: Fn(Arc<HandlerContext>, ApiGatewayProxyRequest) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = ApiGatewayProxyResponse> + Send,
{
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize tracing: {e}");
    }

    let context = Arc::new(build_context().await?);

    run(service_fn(move |event: LambdaEvent<ApiGatewayProxyRequest>| {
        let context = Arc::clone(&context);
        let handler = handler.clone();
        async move {
            let trace_context = LambdaTraceContext::from_lambda_context(&event.context);
            let span = create_lambda_span(operation, &trace_context);

            let response = handler(context, event.payload).instrument(span).await;
            Ok::<ApiGatewayProxyResponse, Error>(response)
        }
    }))
    .await
}
