//! webime-pinyin crate root
//!
//! Pinyin front end for `webime-core`: the default confusion presets, the
//! syllable table, and two phrase sources that plug into the engine's
//! re-ranking hook.
//!
//! Public API exported here:
//! - `PinyinConfig` from `config`
//! - `PINYIN_SYLLABLES` and `split_syllables` from `syllables`
//! - `SentenceComposer` from `composer`
//! - `RemotePhraseService` from `cloud`
//! - `build_engine` to wire a configured `Engine`

pub mod cloud;
pub mod composer;
pub mod config;
pub mod syllables;

// Re-export the core types callers need alongside the pinyin pieces.
pub use webime_core::{
    Candidate, CandidateSource, Config, DictionaryKind, DictionaryRegistry, DictionarySpec,
    Engine, ImeEngine, InputMode, JsonFile, KeyEvent, KeyResult, RenderState, UsageStore,
};

pub use cloud::{RemoteCandidate, RemotePhraseService, RequestMethod};
pub use composer::SentenceComposer;
pub use config::{pinyin_default_fuzzy_rules, PinyinConfig};
pub use syllables::{is_syllable, split_syllables, PINYIN_SYLLABLES};

/// Build an `Engine` from a pinyin configuration.
///
/// The remote service, when an endpoint is configured, takes
/// the re-ranking slot; otherwise the local composer does (if enabled).
pub fn build_engine(config: &PinyinConfig) -> webime_core::Result<Engine> {
    let engine = Engine::new(&config.base)?;
    let engine = match (&config.remote_endpoint, config.composer_enabled) {
        (Some(endpoint), _) => {
            let mut svc = RemotePhraseService::new(endpoint.as_str())
                .with_timeout(config.remote_timeout_ms);
            svc.set_enabled(true);
            engine.with_reranker(Box::new(svc))
        }
        (None, true) => engine.with_reranker(Box::new(SentenceComposer::new(
            config.composer_lookahead,
        ))),
        (None, false) => engine,
    };
    Ok(engine)
}
