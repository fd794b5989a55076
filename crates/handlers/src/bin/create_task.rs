use handlers::task::{create_task, create::OPERATION};
use handlers::runtime::serve;
use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(OPERATION, create_task).await
}
