use handlers::list::{create_list, create::OPERATION};
use handlers::runtime::serve;
use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(OPERATION, create_list).await
}
