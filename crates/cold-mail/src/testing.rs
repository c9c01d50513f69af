//! Shared test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use outreach_common::embedding::TextEmbedder;
use outreach_common::error::CommonError;

const HASH_DIMENSIONS: usize = 32;

/// Bag-of-words embedder: each lowercase token bumps one FNV-1a bucket, then the vector
/// is L2-normalized. Texts sharing words land close together.
#[derive(Default)]
pub struct HashEmbedder {
    document_calls: AtomicUsize,
}

impl HashEmbedder {
    /// How many times `embed_documents` ran, i.e. how many ingestions happened.
    pub fn document_calls(&self) -> usize {
        self.document_calls.load(Ordering::SeqCst)
    }

    fn embed(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; HASH_DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = fnv1a(&token.to_lowercase()) % HASH_DIMENSIONS as u64;
            v[bucket as usize] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

#[async_trait]
impl TextEmbedder for HashEmbedder {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, CommonError> {
        self.document_calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::embed(t)).collect())
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, CommonError> {
        Ok(Self::embed(query))
    }

    fn dimensions(&self) -> usize {
        HASH_DIMENSIONS
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// An OpenAI-style chat completion body whose single choice says `content`.
pub fn completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2 }
    })
}
