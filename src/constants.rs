//! Provider-specific data tables. Endpoint paths and body markers drift as
//! the provider ships redesigns, so they live here as injectable values
//! rather than being scattered through the call sites.

/// Seed for the public-id <-> api-id transform.
pub const DEFAULT_ID_SEED: u64 = 265_224_201_205;

/// Client string the mobile application reports.
pub const ANDROID_CLIENT: &str = "android_8_15.2.1";

/// Referrer the mobile application sends on first login.
pub const LOGIN_REFERRER: &str = "utm_source=google-play&utm_medium=organic";

/// User agent of the emulated mobile browser.
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; U; Android 4.0.3; ko-kr; LG-L160L \
     Build/IML74K) AppleWebkit/534.30 (KHTML, like Gecko) Version/4.0 Mobile Safari/534.30";

/// Relative paths of the mobile-web surface.
#[derive(Debug, Clone)]
pub struct Pages {
    pub login: String,
    pub logout: String,
    pub news: String,
    pub guests: String,
    pub events: String,
    pub settings: String,
}

impl Default for Pages {
    fn default() -> Self {
        Self {
            login: "dk?bk=GuestMain".to_string(),
            logout: "dk?bk=Logoff&st.cmd=logoff&_prevCmd=logoff".to_string(),
            news: "dk?st.cmd=userMain&_prevCmd=userMain&_aid=leftMenuClick".to_string(),
            guests: "dk?st.cmd=userGuests&_prevCmd=userGuests&_aid=leftMenuClick".to_string(),
            events: "dk?st.cmd=userEvents&st.rf=on&_prevCmd=userEvents&_aid=leftMenuClick"
                .to_string(),
            settings: "dk?st.cmd=userSettings&_prevCmd=userMain".to_string(),
        }
    }
}

/// Body substrings used to classify a response without a DOM tree.
#[derive(Debug, Clone)]
pub struct StatusMarkers {
    /// Account permanently blocked by the provider.
    pub user_blocked: String,
    /// Account frozen, phone verification required.
    pub user_frozen: String,
    /// Group disabled.
    pub group_disabled: String,
    /// Generic provider error page.
    pub error_page: String,
    /// Automated-traffic challenge.
    pub captcha: String,
    /// Marker present on any page served to an authenticated user.
    pub authenticated: String,
}

impl Default for StatusMarkers {
    fn default() -> Self {
        Self {
            user_blocked: "accountBlockedByAdminStub".to_string(),
            user_frozen: "uvPrePhoneCaptcha".to_string(),
            group_disabled: "group-disabled".to_string(),
            error_page: "error-page".to_string(),
            captcha: "id=\"captcha\"".to_string(),
            authenticated: "userMain".to_string(),
        }
    }
}
