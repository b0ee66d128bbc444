use seal_crypto::{Digest, HashContext, HashKind};
use seal_stream::{Stream, StreamError, StreamResult};
use tracing::trace;

/// Digest of one content stream and the number of bytes it covered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentDigest {
    pub digest: Digest,
    pub extent: u64,
}

/// Hash a stream from its current position to end of stream.
pub fn digest_stream(
    stream: &mut Stream,
    kind: HashKind,
    chunk_size: usize,
) -> StreamResult<ContentDigest> {
    let mut context = HashContext::new(kind);
    let size = chunk_size.max(1);
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| StreamError::Allocation { requested: size })?;
    buf.resize(size, 0);
    let mut extent = 0u64;
    loop {
        let n = stream.read_chunk(&mut buf)?;
        if n == 0 {
            break;
        }
        context.update(&buf[..n]);
        extent += n as u64;
    }
    let digest = context.finish();
    trace!(reference = %stream.reference(), %kind, extent, "content digested");
    Ok(ContentDigest { digest, extent })
}
