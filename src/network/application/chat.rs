//! Chat-completion client over the request pipeline.
//!
//! Posts a single user message to an OpenAI-style `chat/completions`
//! endpoint and returns the first choice's content. The request body is
//! serialised and the response parsed with `serde-json-core`, so nothing is
//! allocated: the response body is collected into a fixed buffer of
//! [`RESPONSE_CAPACITY`] bytes.

#![deny(unsafe_code)]

use core::fmt::Write as _;

use heapless::{String, Vec};
use serde::{Deserialize, Serialize};

use crate::config::PAYLOAD_CAPACITY;
use crate::network::Stack;
use crate::network::application::http::{FinalCall, Method, Response};
use crate::network::application::requests::{
    self, Outcome, RequestContext, RequestOption,
};

/// Maximum length of the returned answer.
pub const ANSWER_CAPACITY: usize = 512;
/// Maximum size of the collected response body.
pub const RESPONSE_CAPACITY: usize = 2048;
/// Maximum length of the bearer token.
pub const TOKEN_CAPACITY: usize = 160;

const AUTHORIZATION_CAPACITY: usize = TOKEN_CAPACITY + 24;

/// One chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage<'a> {
    /// `system`, `user` or `assistant`
    #[serde(borrow)]
    pub role: &'a str,
    /// Message text
    #[serde(borrow)]
    pub content: &'a str,
}

/// Request body of a chat completion.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChatRequest<'a> {
    /// Model identifier
    pub model: &'a str,
    /// Conversation so far
    pub messages: &'a [ChatMessage<'a>],
}

/// The fields of a completion response this client reads.
#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    /// Candidate answers
    pub choices: Vec<Choice, 4>,
}

/// One candidate answer.
#[derive(Debug, Deserialize)]
pub struct Choice {
    /// The generated message
    pub message: AnswerMessage,
}

/// The generated message, unescaped.
#[derive(Debug, Deserialize)]
pub struct AnswerMessage {
    /// Message text
    pub content: String<ANSWER_CAPACITY>,
}

/// Error types for chat operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatError {
    /// The request pipeline failed.
    Request(requests::Error),
    /// The server answered with a non-2xx status.
    Status(u16),
    /// Body, header or answer does not fit its buffer.
    BufferOverflow,
    /// The response is not a chat completion.
    ParseError,
    /// The completion has no choices.
    EmptyAnswer,
}

impl ChatError {
    /// Negative errno-style code.
    pub const fn code(&self) -> i32 {
        match self {
            ChatError::Request(err) => err.code(),
            ChatError::Status(_) => -5,       // EIO
            ChatError::BufferOverflow => -105, // ENOBUFS
            ChatError::ParseError => -74,     // EBADMSG
            ChatError::EmptyAnswer => -61,    // ENODATA
        }
    }
}

impl From<requests::Error> for ChatError {
    fn from(err: requests::Error) -> Self {
        ChatError::Request(err)
    }
}

impl core::fmt::Display for ChatError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ChatError::Request(err) => write!(f, "request failed: {}", err),
            ChatError::Status(code) => write!(f, "HTTP status {}", code),
            ChatError::BufferOverflow => write!(f, "buffer overflow"),
            ChatError::ParseError => write!(f, "malformed completion"),
            ChatError::EmptyAnswer => write!(f, "completion has no choices"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ChatError {}

#[cfg(feature = "defmt")]
impl defmt::Format for ChatError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ChatError::Request(err) => defmt::write!(f, "Request({})", err),
            ChatError::Status(code) => defmt::write!(f, "Status({})", code),
            ChatError::BufferOverflow => defmt::write!(f, "BufferOverflow"),
            ChatError::ParseError => defmt::write!(f, "ParseError"),
            ChatError::EmptyAnswer => defmt::write!(f, "EmptyAnswer"),
        }
    }
}

/// Serialise the request body for `prompt` into `buf`.
pub fn encode_request(model: &str, prompt: &str, buf: &mut [u8]) -> Result<usize, ChatError> {
    let messages = [ChatMessage {
        role: "user",
        content: prompt,
    }];
    let request = ChatRequest {
        model,
        messages: &messages,
    };
    serde_json_core::to_slice(&request, buf).map_err(|_| ChatError::BufferOverflow)
}

/// Extract the first choice's content from a completion body.
///
/// JSON escapes in the content are decoded.
pub fn parse_answer(body: &[u8]) -> Result<String<ANSWER_CAPACITY>, ChatError> {
    let mut scratch = [0u8; ANSWER_CAPACITY];
    let (completion, _): (ChatCompletion, _) =
        serde_json_core::from_slice_escaped(body, &mut scratch).map_err(|err| match err {
            serde_json_core::de::Error::EscapedStringIsTooLong => ChatError::BufferOverflow,
            _ => ChatError::ParseError,
        })?;
    completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or(ChatError::EmptyAnswer)
}

/// Ask `model` at `endpoint` a single question.
pub fn ask<S>(
    stack: &mut S,
    endpoint: &str,
    token: &str,
    model: &str,
    prompt: &str,
) -> Result<String<ANSWER_CAPACITY>, ChatError>
where
    S: Stack + ?Sized,
{
    let mut payload = [0u8; PAYLOAD_CAPACITY];
    let payload_len = encode_request(model, prompt, &mut payload)?;
    if payload_len >= PAYLOAD_CAPACITY {
        return Err(ChatError::BufferOverflow);
    }

    let mut authorization: String<AUTHORIZATION_CAPACITY> = String::new();
    write!(authorization, "Authorization: Bearer {}\r\n", token)
        .map_err(|_| ChatError::BufferOverflow)?;
    let headers = [
        "User-Agent: curl/7.81.0\r\n",
        "Accept: */*\r\n",
        "Content-Type: application/json\r\n",
        authorization.as_str(),
    ];

    let mut body: Vec<u8, RESPONSE_CAPACITY> = Vec::new();
    let mut overflow = false;
    let mut collect = |response: &Response<'_>, _: FinalCall, outcome: &mut Outcome| {
        outcome.status_code = response.http_status_code;
        if body.extend_from_slice(response.body_fragment).is_err() {
            overflow = true;
        }
    };

    let status = {
        let mut ctx = RequestContext::new();
        ctx.init(stack, endpoint)?;
        ctx.set_option(RequestOption::Headers(&headers));
        ctx.set_option(RequestOption::ProtocolVersion("HTTP/1.1"));
        ctx.set_option(RequestOption::ResponseCallback(&mut collect));
        ctx.set_option(RequestOption::PayloadBody(&payload[..payload_len]));
        ctx.execute(stack, Method::Post)?;
        ctx.status_code()
    };

    if !(200..300).contains(&status) {
        warn!("Chat completion failed with status {}", status);
        return Err(ChatError::Status(status));
    }
    if overflow {
        return Err(ChatError::BufferOverflow);
    }

    parse_answer(&body)
}
