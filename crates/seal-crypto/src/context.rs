use std::io;

use zeroize::Zeroize;

use crate::digest::{Digest, MAX_DIGEST_SIZE};
use crate::kind::HashKind;

/// Compression function block size in bytes.
pub const BLOCK_SIZE: usize = 64;

/// Offset of the 64-bit message length within the final block.
const LENGTH_OFFSET: usize = BLOCK_SIZE - 8;

/// Round constants: first 32 bits of the fractional parts of the cube roots
/// of the first 64 primes.
const K: [u32; 64] = [
    0x428a2f98, 0x71374491, 0xb5c0fbcf, 0xe9b5dba5, 0x3956c25b, 0x59f111f1, 0x923f82a4, 0xab1c5ed5,
    0xd807aa98, 0x12835b01, 0x243185be, 0x550c7dc3, 0x72be5d74, 0x80deb1fe, 0x9bdc06a7, 0xc19bf174,
    0xe49b69c1, 0xefbe4786, 0x0fc19dc6, 0x240ca1cc, 0x2de92c6f, 0x4a7484aa, 0x5cb0a9dc, 0x76f988da,
    0x983e5152, 0xa831c66d, 0xb00327c8, 0xbf597fc7, 0xc6e00bf3, 0xd5a79147, 0x06ca6351, 0x14292967,
    0x27b70a85, 0x2e1b2138, 0x4d2c6dfc, 0x53380d13, 0x650a7354, 0x766a0abb, 0x81c2c92e, 0x92722c85,
    0xa2bfe8a1, 0xa81a664b, 0xc24b8b70, 0xc76c51a3, 0xd192e819, 0xd6990624, 0xf40e3585, 0x106aa070,
    0x19a4c116, 0x1e376c08, 0x2748774c, 0x34b0bcb5, 0x391c0cb3, 0x4ed8aa4a, 0x5b9cca4f, 0x682e6ff3,
    0x748f82ee, 0x78a5636f, 0x84c87814, 0x8cc70208, 0x90befffa, 0xa4506ceb, 0xbef9a3f7, 0xc67178f2,
];

/// Incremental SHA-2/32 computation.
///
/// Input can be fed in chunks of any size; the digest depends only on the
/// concatenation. The message length is tracked in bits as a 64-bit counter
/// split across two 32-bit words, wrapping modulo 2^64.
///
/// All internal state is wiped on drop.
#[derive(Clone)]
pub struct HashContext {
    kind: HashKind,
    accumulator: [u32; 8],
    block: [u8; BLOCK_SIZE],
    offset: usize,
    low_order: u32,
    high_order: u32,
    digest: [u8; MAX_DIGEST_SIZE],
    lsb_first: bool,
    finalized: bool,
}

impl HashContext {
    /// Create a context ready to accept input.
    pub fn new(kind: HashKind) -> Self {
        Self {
            kind,
            accumulator: kind.initial_state(),
            block: [0; BLOCK_SIZE],
            offset: 0,
            low_order: 0,
            high_order: 0,
            digest: [0; MAX_DIGEST_SIZE],
            lsb_first: cfg!(target_endian = "little"),
            finalized: false,
        }
    }

    /// Reset to the initial state, discarding any buffered input and digest.
    pub fn initialize(&mut self) {
        self.accumulator = self.kind.initial_state();
        self.block.zeroize();
        self.digest.zeroize();
        self.offset = 0;
        self.low_order = 0;
        self.high_order = 0;
        self.finalized = false;
    }

    /// The algorithm this context computes.
    pub fn kind(&self) -> HashKind {
        self.kind
    }

    /// Whether [`finalize`](Self::finalize) has run since the last reset.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Total message length absorbed so far, in bits, modulo 2^64.
    pub fn bit_length(&self) -> u64 {
        (u64::from(self.high_order) << 32) | u64::from(self.low_order)
    }

    /// Absorb `data`. Empty input is a no-op.
    pub fn update(&mut self, data: &[u8]) {
        debug_assert!(!self.finalized, "update after finalize");
        if data.is_empty() {
            return;
        }

        let bits = (data.len() as u64).wrapping_mul(8);
        let (low, carry) = self.low_order.overflowing_add(bits as u32);
        self.low_order = low;
        self.high_order = self
            .high_order
            .wrapping_add((bits >> 32) as u32)
            .wrapping_add(u32::from(carry));

        let mut input = data;
        if self.offset > 0 {
            let take = (BLOCK_SIZE - self.offset).min(input.len());
            self.block[self.offset..self.offset + take].copy_from_slice(&input[..take]);
            self.offset += take;
            input = &input[take..];
            if self.offset < BLOCK_SIZE {
                return;
            }
            transform(&mut self.accumulator, &self.block, self.lsb_first);
            self.offset = 0;
        }

        let mut blocks = input.chunks_exact(BLOCK_SIZE);
        for block in &mut blocks {
            transform(&mut self.accumulator, block, self.lsb_first);
        }
        let rest = blocks.remainder();
        self.block[..rest.len()].copy_from_slice(rest);
        self.offset = rest.len();
    }

    /// Pad the message, fold in the length, and produce the digest.
    ///
    /// Must be called exactly once per message. Calling it again without
    /// [`initialize`](Self::initialize) would hash the padding a second time.
    pub fn finalize(&mut self) {
        debug_assert!(!self.finalized, "finalize called twice");

        let mut offset = self.offset;
        self.block[offset] = 0x80;
        offset += 1;
        if offset > LENGTH_OFFSET {
            self.block[offset..].fill(0);
            transform(&mut self.accumulator, &self.block, self.lsb_first);
            self.block[..LENGTH_OFFSET].fill(0);
        } else {
            self.block[offset..LENGTH_OFFSET].fill(0);
        }
        self.block[LENGTH_OFFSET..LENGTH_OFFSET + 4].copy_from_slice(&self.high_order.to_be_bytes());
        self.block[LENGTH_OFFSET + 4..].copy_from_slice(&self.low_order.to_be_bytes());
        transform(&mut self.accumulator, &self.block, self.lsb_first);

        for (out, word) in self.digest.chunks_exact_mut(4).zip(self.accumulator) {
            out.copy_from_slice(&word.to_be_bytes());
        }
        self.block.zeroize();
        self.offset = 0;
        self.finalized = true;
    }

    /// The digest bytes, truncated to the algorithm's size.
    ///
    /// Only meaningful after [`finalize`](Self::finalize).
    pub fn digest(&self) -> &[u8] {
        debug_assert!(self.finalized, "digest read before finalize");
        &self.digest[..self.kind.digest_size()]
    }

    /// Lowercase hex of [`digest`](Self::digest).
    pub fn hex_digest(&self) -> String {
        hex::encode(self.digest())
    }

    /// Finalize (if not already) and return the digest, consuming the context.
    pub fn finish(mut self) -> Digest {
        if !self.finalized {
            self.finalize();
        }
        Digest::from_array(self.kind, self.digest)
    }
}

impl Default for HashContext {
    fn default() -> Self {
        Self::new(HashKind::default())
    }
}

impl std::fmt::Debug for HashContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashContext")
            .field("kind", &self.kind)
            .field("bit_length", &self.bit_length())
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

impl io::Write for HashContext {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for HashContext {
    fn drop(&mut self) {
        self.accumulator.zeroize();
        self.block.zeroize();
        self.digest.zeroize();
        self.offset = 0;
        self.low_order = 0;
        self.high_order = 0;
    }
}

#[inline(always)]
fn ch(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (!x & z)
}

#[inline(always)]
fn maj(x: u32, y: u32, z: u32) -> u32 {
    (x & y) ^ (x & z) ^ (y & z)
}

#[inline(always)]
fn suma0(x: u32) -> u32 {
    x.rotate_right(2) ^ x.rotate_right(13) ^ x.rotate_right(22)
}

#[inline(always)]
fn suma1(x: u32) -> u32 {
    x.rotate_right(6) ^ x.rotate_right(11) ^ x.rotate_right(25)
}

#[inline(always)]
fn sigma0(x: u32) -> u32 {
    x.rotate_right(7) ^ x.rotate_right(18) ^ (x >> 3)
}

#[inline(always)]
fn sigma1(x: u32) -> u32 {
    x.rotate_right(17) ^ x.rotate_right(19) ^ (x >> 10)
}

/// Compress one 64-byte block into the accumulator.
fn transform(accumulator: &mut [u32; 8], block: &[u8], lsb_first: bool) {
    debug_assert_eq!(block.len(), BLOCK_SIZE);

    let mut w = [0u32; 64];
    for (word, bytes) in w.iter_mut().zip(block.chunks_exact(4)) {
        let raw = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        *word = if lsb_first { raw.swap_bytes() } else { raw };
    }
    for i in 16..64 {
        w[i] = sigma1(w[i - 2])
            .wrapping_add(w[i - 7])
            .wrapping_add(sigma0(w[i - 15]))
            .wrapping_add(w[i - 16]);
    }

    let mut r = *accumulator;
    for i in 0..64 {
        let t1 = r[7]
            .wrapping_add(suma1(r[4]))
            .wrapping_add(ch(r[4], r[5], r[6]))
            .wrapping_add(K[i])
            .wrapping_add(w[i]);
        let t2 = suma0(r[0]).wrapping_add(maj(r[0], r[1], r[2]));
        r[7] = r[6];
        r[6] = r[5];
        r[5] = r[4];
        r[4] = r[3].wrapping_add(t1);
        r[3] = r[2];
        r[2] = r[1];
        r[1] = r[0];
        r[0] = t1.wrapping_add(t2);
    }

    for (acc, reg) in accumulator.iter_mut().zip(r) {
        *acc = acc.wrapping_add(reg);
    }
    r.zeroize();
    w.zeroize();
}
