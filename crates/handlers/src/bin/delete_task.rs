use handlers::task::{delete_task, delete::OPERATION};
use handlers::runtime::serve;
use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(OPERATION, delete_task).await
}
