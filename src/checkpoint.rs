//! Binary checkpoints of a whole network.
//!
//! Layout: the `CRNN` magic, a big endian `u32` version, a big endian `u32` header length, a
//! JSON header with the configuration and optional vocabulary, then the `f32` payload in
//! native byte order: parameters (`wxh`, `whh`, `why`, `bh`, `by`), hidden state and Adagrad
//! memory (same layout as the parameters).

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::{
    codec::Vocabulary,
    config::NetworkConfig,
    error::{Result, RnnErr},
    parameters::{Network, Parameters},
};

const MAGIC: &[u8; 4] = b"CRNN";
const VERSION: u32 = 1;

type Len = u32;
const PREAMBLE_SIZE: usize = MAGIC.len() + 2 * size_of::<Len>();
const FLOAT_SIZE: usize = size_of::<f32>();

#[derive(Serialize)]
struct HeaderRef<'a> {
    config: &'a NetworkConfig,
    vocabulary: Option<&'a Vocabulary>,
}

#[derive(Deserialize)]
struct Header {
    config: NetworkConfig,
    vocabulary: Option<Vocabulary>,
}

/// A decoded checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub network: Network,
    pub vocabulary: Option<Vocabulary>,
}

impl Checkpoint {
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(&self.network, self.vocabulary.as_ref())
    }

    /// Decodes a checkpoint produced by `encode`.
    ///
    /// # Returns
    /// A serialization error if `bytes` is truncated, has trailing data, the wrong magic or
    /// version, or a header the payload doesn't agree with.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < PREAMBLE_SIZE {
            return malformed(format!(
                "{} bytes is too small, at least {PREAMBLE_SIZE} are needed",
                bytes.len()
            ));
        }

        let (magic, rest) = bytes.split_at(MAGIC.len());
        if magic != MAGIC {
            return malformed("bad magic bytes".into());
        }

        let (version, rest) = read_len(rest);
        if version != VERSION {
            return malformed(format!("unsupported version {version}"));
        }

        let (header_len, rest) = read_len(rest);
        let header_len = header_len as usize;
        if rest.len() < header_len {
            return malformed(format!(
                "header of {header_len} bytes but only {} left",
                rest.len()
            ));
        }

        let (header, payload) = rest.split_at(header_len);
        let Header { config, vocabulary } = serde_json::from_slice(header)?;
        config.validate()?;

        if let Some(vocabulary) = &vocabulary {
            if vocabulary.len() != config.input_size {
                return malformed(format!(
                    "vocabulary of {} symbols for an input of {}",
                    vocabulary.len(),
                    config.input_size
                ));
            }
        }

        let params_len = Parameters::count(&config);
        let expected = (2 * params_len + config.hidden_size) * FLOAT_SIZE;
        if payload.len() != expected {
            return malformed(format!(
                "payload of {} bytes, expected {expected}",
                payload.len()
            ));
        }

        let floats: Vec<f32> = payload
            .chunks_exact(FLOAT_SIZE)
            .map(bytemuck::pod_read_unaligned)
            .collect();

        let (params, rest) = floats.split_at(params_len);
        let (hidden, memory) = rest.split_at(config.hidden_size);

        let params = Parameters::from_flat(&config, params)?;
        let memory = Parameters::from_flat(&config, memory)?;
        let hidden = Array1::from_vec(hidden.to_vec());

        Ok(Self {
            network: Network::from_parts(config, params, hidden, memory)?,
            vocabulary,
        })
    }
}

/// Encodes `network`, and optionally `vocabulary`, into checkpoint bytes.
pub fn encode(network: &Network, vocabulary: Option<&Vocabulary>) -> Result<Vec<u8>> {
    let header = serde_json::to_vec(&HeaderRef {
        config: network.config(),
        vocabulary,
    })?;

    let header_len = Len::try_from(header.len())
        .map_err(|_| RnnErr::Serialization("checkpoint header too large".into()))?;

    let params = network.params().flatten();
    let memory = network.optimizer().memory().flatten();
    let hidden = network.hidden();

    let mut buf = Vec::with_capacity(
        PREAMBLE_SIZE + header.len() + (2 * params.len() + hidden.len()) * FLOAT_SIZE,
    );

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&VERSION.to_be_bytes());
    buf.extend_from_slice(&header_len.to_be_bytes());
    buf.extend_from_slice(&header);
    buf.extend_from_slice(bytemuck::cast_slice(&params));
    for h in hidden.iter() {
        buf.extend_from_slice(bytemuck::bytes_of(h));
    }
    buf.extend_from_slice(bytemuck::cast_slice(&memory));

    Ok(buf)
}

fn read_len(buf: &[u8]) -> (Len, &[u8]) {
    let (len, rest) = buf.split_at(size_of::<Len>());
    let mut raw = [0; size_of::<Len>()];
    raw.copy_from_slice(len);
    (Len::from_be_bytes(raw), rest)
}

fn malformed<T>(reason: String) -> Result<T> {
    Err(RnnErr::Serialization(format!("malformed checkpoint: {reason}")))
}
