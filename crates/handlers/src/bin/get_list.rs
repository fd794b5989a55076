use handlers::list::{get_list, get::OPERATION};
use handlers::runtime::serve;
use lambda_runtime::Error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    serve(OPERATION, get_list).await
}
