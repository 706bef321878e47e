pub const DEFAULT_PUBLIC_ENTRY: &str = "/";
pub const DEFAULT_LANDING: &str = "/cafe/dashboard";
/// Largest accepted clock-skew allowance, one day.
pub const MAX_LEEWAY_SECONDS: u32 = 86_400;

/// Options for reading claims out of a stored token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Allowable clock skew in seconds when checking `exp`.
    pub leeway_seconds: u32,
    /// Reject tokens whose `exp` is in the past.
    pub validate_expiry: bool,
}

impl DecodeConfig {
    /// Expiry checked with a 30 second leeway.
    pub fn new() -> Self {
        Self {
            leeway_seconds: 30,
            validate_expiry: true,
        }
    }

    /// Sets the leeway, capped at [`MAX_LEEWAY_SECONDS`].
    pub fn with_leeway(mut self, seconds: u32) -> Self {
        self.leeway_seconds = seconds.min(MAX_LEEWAY_SECONDS);
        self
    }

    /// Leeway as applied when decoding, whatever the field was set to.
    pub fn effective_leeway(&self) -> u64 {
        u64::from(self.leeway_seconds.min(MAX_LEEWAY_SECONDS))
    }

    pub fn without_expiry_check(mut self) -> Self {
        self.validate_expiry = false;
        self
    }
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the guard and the request authenticator send the user, and how tokens are read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Unauthenticated entry point; target after logout or an invalid token.
    pub public_entry: String,
    /// Protected landing page; target when a valid session lacks the required role.
    pub default_landing: String,
    pub decode: DecodeConfig,
}

impl GuardConfig {
    pub fn new(public_entry: impl Into<String>, default_landing: impl Into<String>) -> Self {
        Self {
            public_entry: public_entry.into(),
            default_landing: default_landing.into(),
            decode: DecodeConfig::new(),
        }
    }

    pub fn with_decode(mut self, decode: DecodeConfig) -> Self {
        self.decode = decode;
        self
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PUBLIC_ENTRY, DEFAULT_LANDING)
    }
}
