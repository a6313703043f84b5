use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};

/// URI schemes the handler binds and accepts
pub const DIAL_SCHEMES: [&str; 2] = ["tel", "callto"];

/// Identity and wiring for one protocol-handler deployment.
///
/// Built once at process start and passed by reference into the association
/// store, host locator and dispatcher; there is no global mutable state.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// ProgId key name under the user-scope classes namespace
    pub prog_id: String,

    /// Human-readable application name (also the RegisteredApplications value name)
    pub prog_name: String,

    /// Description advertised in the capabilities entry
    pub description: String,

    /// Version string reported by `status`
    pub version: String,

    /// Audit log file name, colocated with the running artifact
    pub log_filename: String,

    /// Start-menu shortcut file installed by the companion PWA
    pub shortcut_name: String,

    /// Companion browser binary name
    pub browser_exe: String,

    /// Dedicated-app launcher binary name, siblings with the browser
    pub launcher_exe: String,

    /// App Paths registration for the companion browser
    pub app_paths_key: String,

    /// Calling-service URL template; `{number}` is replaced with the
    /// percent-encoded normalized number
    pub service_url: String,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        let prog_id = "Google Voice Dialer".to_string();
        Self {
            prog_name: prog_id.clone(),
            description: "Google Voice tel: protocol handler. Dial phone numbers using Google Voice."
                .to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            log_filename: format!("{prog_id}.log"),
            shortcut_name: "Google Voice.lnk".to_string(),
            browser_exe: "chrome.exe".to_string(),
            launcher_exe: "chrome_proxy.exe".to_string(),
            app_paths_key: r"SOFTWARE\Microsoft\Windows\CurrentVersion\App Paths\chrome.exe"
                .to_string(),
            service_url: "https://voice.google.com/u/0/calls?a=nc,{number}".to_string(),
            prog_id,
        }
    }
}

impl HandlerConfig {
    /// Calling-service URL for a normalized number.
    ///
    /// The number is percent-encoded, so a leading `+` travels as `%2B`.
    pub fn call_url(&self, number: &str) -> String {
        let encoded = utf8_percent_encode(number, NON_ALPHANUMERIC).to_string();
        self.service_url.replace("{number}", &encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn call_url_percent_encodes_the_number() {
        let config = HandlerConfig::default();
        assert_eq!(
            config.call_url("+15551234567"),
            "https://voice.google.com/u/0/calls?a=nc,%2B15551234567"
        );
        assert_eq!(
            config.call_url("18005550100"),
            "https://voice.google.com/u/0/calls?a=nc,18005550100"
        );
    }
}
