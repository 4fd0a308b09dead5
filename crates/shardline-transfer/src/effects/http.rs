use std::future::Future;
use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Request body handed to [`HttpClient::put`].
pub type UploadBody = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send + Sync + 'static>>;

/// Asynchronous HTTP client abstraction.
///
/// Implementations own connection setup, TLS trust and proxying. They do not
/// judge status codes and do not retry.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Send `body` with a PUT request and return the response status.
    ///
    /// An error item from `body` must abort the request.
    fn put(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: UploadBody,
    ) -> impl Future<Output = Result<u16, Self::Error>> + Send;

    /// Issue a GET request and return the status with the streaming body.
    fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<(u16, BoxStream<'static, Result<Bytes, Self::Error>>), Self::Error>>
           + Send;
}

/// Render an error and its sources as one diagnostic line.
pub(crate) fn describe(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use futures_util::StreamExt;

    use super::*;
    use crate::data::HttpOptions;
    use crate::error::{Error, Result};

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Build a client with the user agent, proxy and timeouts in `options`.
        pub fn new(options: &HttpOptions) -> Result<Self> {
            let mut builder = reqwest::Client::builder();

            if let Some(user_agent) = &options.user_agent {
                builder = builder.user_agent(user_agent);
            }
            if let Some(proxy) = &options.proxy {
                let proxy = reqwest::Proxy::all(proxy.url())
                    .map_err(|e| Error::Config(format!("invalid proxy {}: {e}", proxy.url())))?;
                builder = builder.proxy(proxy);
            }
            if let Some(timeout) = options.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            if let Some(timeout) = options.request_timeout {
                builder = builder.timeout(timeout);
            }

            let client = builder.build().map_err(|e| Error::Config(describe(&e)))?;
            Ok(Self { client })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn put(
            &self,
            url: &str,
            headers: &[(String, String)],
            body: UploadBody,
        ) -> std::result::Result<u16, Self::Error> {
            let mut request = self.client.put(url).body(reqwest::Body::wrap_stream(body));

            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            Ok(response.status().as_u16())
        }

        async fn get(
            &self,
            url: &str,
            headers: &[(String, String)],
        ) -> std::result::Result<(u16, BoxStream<'static, std::result::Result<Bytes, Self::Error>>), Self::Error>
        {
            let mut request = self.client.get(url);

            for (key, value) in headers {
                request = request.header(key, value);
            }

            let response = request.send().await?;
            let status = response.status().as_u16();
            let stream = response.bytes_stream().map(|result| result.map(Bytes::from));

            Ok((status, Box::pin(stream)))
        }
    }

}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestClient;
