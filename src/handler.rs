//! Decode → invoke → encode, with every failure answered as a fault.

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::config::CodecConfig;
use crate::decode::{MethodCall, decode_with_config};
use crate::encode::Encoder;
use crate::error::{Error, Result};
use crate::fault::{Fault, translate};
use crate::registry::{MethodDescriptor, MethodRegistry};
use crate::value::Value;

/// Run a resolved method. A deferred result is awaited exactly once.
pub async fn invoke(method: &MethodDescriptor, params: Vec<Value>) -> Result<Value> {
    debug!(method = method.name(), "invoking XML-RPC method");
    method.invoke(params).resolve().await?.ok_or_else(|| {
        Error::Internal(format!(
            "{} returned null, expected {}",
            method.name(),
            method.returns().name()
        ))
    })
}

/// Invoke `method` and write its `<methodResponse>` to `output`.
pub async fn invoke_and_encode<W>(
    method: &MethodDescriptor,
    params: Vec<Value>,
    output: &mut W,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let config = CodecConfig::default();
    let value = invoke(method, params).await?;
    let bytes = render_response(&value, &config)?;
    write_out(output, &bytes).await
}

/// Write a fault `<methodResponse>` to `output`.
pub async fn encode_fault<W>(code: i32, message: &str, output: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = render_fault(&Fault::new(code, message), &CodecConfig::default())?;
    write_out(output, &bytes).await
}

/// Serves requests against a shared registry.
///
/// ```rust
/// use std::sync::Arc;
/// use xmlrpc_serde::{CodecConfig, Handler, MethodRegistry};
///
/// # tokio_test_block(async {
/// let mut registry = MethodRegistry::new();
/// registry.register_fn("echo", |(s,): (String,)| Ok(s)).unwrap();
/// let handler = Handler::with_config(Arc::new(registry), CodecConfig::default().without_declaration());
///
/// let request = b"<methodCall><methodName>echo</methodName><params>\
///     <param><value>hi</value></param></params></methodCall>";
/// let mut out = Vec::new();
/// handler.respond(&request[..], &mut out).await.unwrap();
/// assert_eq!(
///     out,
///     b"<methodResponse><params><param><value><string>hi</string></value></param></params></methodResponse>"
/// );
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Handler {
    registry: Arc<MethodRegistry>,
    config: CodecConfig,
}

impl Handler {
    pub fn new(registry: Arc<MethodRegistry>) -> Self {
        Handler::with_config(registry, CodecConfig::default())
    }

    pub fn with_config(registry: Arc<MethodRegistry>, config: CodecConfig) -> Self {
        Handler { registry, config }
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub async fn decode<R>(&self, input: R) -> Result<MethodCall>
    where
        R: AsyncBufRead + Unpin,
    {
        decode_with_config(input, &self.registry, &self.config).await
    }

    /// Invoke a decoded call and write its response.
    pub async fn invoke_and_encode<W>(&self, call: MethodCall, output: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let bytes = execute(call, &self.config).await?;
        write_out(output, &bytes).await
    }

    pub async fn encode_fault<W>(&self, fault: &Fault, output: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let bytes = render_fault(fault, &self.config)?;
        write_out(output, &bytes).await
    }

    /// Answer one request; see [`respond`].
    pub async fn respond<R, W>(&self, input: R, output: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        respond(input, output, &self.registry, &self.config).await
    }
}

/// Answer one request. Whatever fails along the way (decoding, the handler,
/// or encoding its result) is written as a fault instead; the returned error
/// only reports a failure to write the output.
pub async fn respond<R, W>(
    input: R,
    output: &mut W,
    registry: &MethodRegistry,
    config: &CodecConfig,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let outcome = match decode_with_config(input, registry, config).await {
        Ok(call) => execute(call, config).await,
        Err(e) => Err(e),
    };
    let bytes = match outcome {
        Ok(bytes) => bytes,
        Err(error) => {
            let fault = translate(&error, config);
            warn!(code = fault.code, %error, "answering XML-RPC request with a fault");
            render_fault(&fault, config)?
        }
    };
    write_out(output, &bytes).await
}

/// Invoke and render in memory, so a failure never leaves a partial response
/// on the output.
async fn execute(call: MethodCall, config: &CodecConfig) -> Result<Vec<u8>> {
    let value = invoke(&call.method, call.params).await?;
    render_response(&value, config)
}

fn render_response(value: &Value, config: &CodecConfig) -> Result<Vec<u8>> {
    let mut encoder = Encoder::with_config(Vec::new(), config);
    encoder.write_response(Some(value))?;
    Ok(encoder.into_inner())
}

fn render_fault(fault: &Fault, config: &CodecConfig) -> Result<Vec<u8>> {
    let mut encoder = Encoder::with_config(Vec::new(), config);
    encoder.write_fault(fault)?;
    Ok(encoder.into_inner())
}

async fn write_out<W: AsyncWrite + Unpin>(output: &mut W, bytes: &[u8]) -> Result<()> {
    output.write_all(bytes).await?;
    output.flush().await?;
    Ok(())
}
