//! `options` accepted by every public Engine operation (spec §4.6).

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub session_id: Option<String>,
    pub force_include_history: Option<bool>,
    pub base_session_id: Option<String>,
    pub system_prompt: Option<String>,
}
