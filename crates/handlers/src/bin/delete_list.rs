use handlers::list::{delete_list, delete::OPERATION};
use handlers::runtime::serve;
use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(OPERATION, delete_list).await
}
