//! Requests against a real HTTP server over the `std` host stack.
//!
//! Set `TEST_HTTP_URL` (or put it in `.env`) and run with
//! `--features std -- --ignored`.

use std::env;

use dotenvy::dotenv;
use embedded_requests::network::application::http::{FinalCall, Method, Response};
use embedded_requests::network::application::requests::{Outcome, RequestContext, RequestOption};
use embedded_requests::network::host::StdStack;

fn test_url() -> String {
    dotenv().ok();
    env::var("TEST_HTTP_URL").unwrap_or("http://httpbin.org/get".to_string())
}

#[test]
#[ignore]
fn test_live_get() {
    let url = test_url();
    let mut stack = StdStack::new();
    let mut body = Vec::new();
    let mut finals = 0;
    let mut collect = |response: &Response<'_>, final_call: FinalCall, outcome: &mut Outcome| {
        outcome.status_code = response.http_status_code;
        body.extend_from_slice(response.body_fragment);
        if final_call == FinalCall::Final {
            finals += 1;
        }
    };

    let status = {
        let mut ctx = RequestContext::new();
        ctx.init(&mut stack, &url).expect("Failed to initialize request");
        ctx.set_option(RequestOption::ProtocolVersion("HTTP/1.1"));
        ctx.set_option(RequestOption::Headers(&["Connection: close\r\n"]));
        ctx.set_option(RequestOption::ResponseCallback(&mut collect));
        ctx.execute(&mut stack, Method::Get).expect("GET request failed");
        assert!(ctx.socket().is_none());
        ctx.status_code()
    };

    assert_eq!(status, 200);
    assert_eq!(finals, 1);
    assert!(!body.is_empty());
}

#[test]
#[ignore]
fn test_live_post() {
    let url = test_url().replace("/get", "/post");
    let mut stack = StdStack::new();
    let mut record = |response: &Response<'_>, _: FinalCall, outcome: &mut Outcome| {
        outcome.status_code = response.http_status_code;
    };

    let mut ctx = RequestContext::new();
    ctx.init(&mut stack, &url).expect("Failed to initialize request");
    ctx.set_option(RequestOption::Headers(&[
        "Content-Type: application/json\r\n",
        "Connection: close\r\n",
    ]));
    ctx.set_option(RequestOption::PayloadBody(br#"{"device":"test"}"#));
    ctx.set_option(RequestOption::ResponseCallback(&mut record));
    ctx.execute(&mut stack, Method::Post).expect("POST request failed");
    assert_eq!(ctx.status_code(), 200);
}
