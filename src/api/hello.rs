#![forbid(unsafe_code)]

use poem::{handler, http::StatusCode, Request, Response};
use std::env;

use crate::utils::hello_utils;

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Environment variable carrying the CI build or run identifier.
const ENV_CI_ID         : &str = "CI_ID";
// Substituted only when the variable is wholly absent from the environment.
const DEFAULT_CI_ID     : &str = "unknown";
// The response content type carries no charset parameter.
const CONTENT_TYPE_TEXT : &str = "text/plain";

// ***************************************************************************
//                             Greeting Endpoint
// ***************************************************************************
// ---------------------------------------------------------------------------
// greet:
// ---------------------------------------------------------------------------
/** Serve the greeting on any path.  The CI identifier is read from the
 * environment on every request, never cached, so an identifier change takes
 * effect on the next request.
 */
#[handler]
pub fn greet(http_req: &Request) -> Response {
    // Conditional logging depending on log level.
    hello_utils::debug_request(http_req);

    Response::builder()
        .status(StatusCode::OK)
        .content_type(CONTENT_TYPE_TEXT)
        .body(make_greeting())
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// make_greeting:
// ---------------------------------------------------------------------------
/** Construct the response message.  An empty-but-set CI_ID passes through
 * unchanged; only a wholly absent variable falls back to the default, which
 * matches the substitution rule of the deployed environment lookup.
 */
fn make_greeting() -> String {
    let ci_id = env::var(ENV_CI_ID).unwrap_or_else(|_| DEFAULT_CI_ID.to_string());
    format!("Hello From Szymon (CI_ID={})", ci_id)
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use poem::{get, http::StatusCode, test::TestClient};
    use std::env;
    use std::sync::Mutex;

    use super::{greet, make_greeting, ENV_CI_ID};

    // Serialize the tests that mutate the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn greeting_env_substitution() {
        let _guard = ENV_LOCK.lock().unwrap();

        env::remove_var(ENV_CI_ID);
        assert_eq!(make_greeting(), "Hello From Szymon (CI_ID=unknown)");

        env::set_var(ENV_CI_ID, "build-42");
        assert_eq!(make_greeting(), "Hello From Szymon (CI_ID=build-42)");

        // An empty value is present, not absent, so it passes through.
        env::set_var(ENV_CI_ID, "");
        assert_eq!(make_greeting(), "Hello From Szymon (CI_ID=)");

        env::remove_var(ENV_CI_ID);
    }

    #[tokio::test]
    async fn greeting_status_and_content_type() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::remove_var(ENV_CI_ID);

        let cli = TestClient::new(get(greet));
        let resp = cli.get("/").send().await;
        resp.assert_status(StatusCode::OK);
        resp.assert_header("content-type", "text/plain");
        resp.assert_text("Hello From Szymon (CI_ID=unknown)").await;
    }

    #[tokio::test]
    async fn greeting_path_independence() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(ENV_CI_ID, "build-42");

        let cli = TestClient::new(get(greet));

        let resp = cli.get("/").send().await;
        resp.assert_status(StatusCode::OK);
        resp.assert_header("content-type", "text/plain");
        resp.assert_text("Hello From Szymon (CI_ID=build-42)").await;

        // A deeper path yields the identical response.
        let resp = cli.get("/anything/else").send().await;
        resp.assert_status(StatusCode::OK);
        resp.assert_header("content-type", "text/plain");
        resp.assert_text("Hello From Szymon (CI_ID=build-42)").await;

        env::remove_var(ENV_CI_ID);
    }

    #[tokio::test]
    async fn greeting_repeats_identically() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var(ENV_CI_ID, "run-7");

        // Sequential requests under the same environment produce
        // byte-identical responses.
        let cli = TestClient::new(get(greet));
        for _ in 0..3 {
            let resp = cli.get("/").send().await;
            resp.assert_status(StatusCode::OK);
            resp.assert_text("Hello From Szymon (CI_ID=run-7)").await;
        }
        assert_eq!(env::var(ENV_CI_ID).unwrap(), "run-7");

        env::remove_var(ENV_CI_ID);
    }
}
