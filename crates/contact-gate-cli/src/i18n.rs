// crates/contact-gate-cli/src/i18n.rs
// ============================================================================
// Module: Contact Gate Message Catalog
// Description: Locale selection and immutable message catalogs.
// Purpose: Centralize user-facing strings for the CLI and form feedback.
// Dependencies: Standard library collections.
// ============================================================================

//! ## Overview
//! Every user-facing string is looked up in a per-locale catalog. The locale is
//! passed explicitly on each call; there is no process-wide selection.
//!
//! ## Invariants
//! - Catalogs are built once and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported locales.
///
/// # Invariants
/// - [`Locale::En`] is the default fallback locale.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// Spanish.
    Es,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Parses a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.split(['-', '_']).next().unwrap_or("") {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }
}

/// Ordered list of supported locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Es];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name without braces.
    pub key: &'static str,
    /// Preformatted substitution value.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`].
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "contact-gate {version}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.check.ok", "Config valid."),
    ("config.check.captcha_mode", "CAPTCHA mode: {mode}"),
    ("config.check.email_key", "Email API key: {status}"),
    ("config.check.captcha_secret", "CAPTCHA secret: {status}"),
    ("config.check.present", "present"),
    ("config.check.missing", "missing"),
    ("serve.init_failed", "Failed to initialize contact server: {error}"),
    ("serve.listening", "Contact server listening on {bind}"),
    ("serve.failed", "Contact server failed: {error}"),
    ("submit.failed", "Could not reach the contact service: {error}"),
    ("submit.captcha.answer_required", "This form requires --answer."),
    ("submit.captcha.token_required", "This form requires --token or --token-file."),
    ("submit.captcha.widget_unavailable", "The CAPTCHA widget did not become ready in time."),
    ("submit.captcha.site_key_missing", "The contact service has no CAPTCHA site key configured."),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'es'."),
    ("form.success", "Thanks! Your message has been sent."),
    ("form.error.validation", "Please correct the highlighted fields."),
    ("form.error.bad_captcha", "CAPTCHA verification failed. Reload the form and try again."),
    ("form.error.too_fast", "That was quick! Please wait a moment and try again."),
    ("form.error.spam", "Your message could not be sent. Please rephrase it and try again."),
    ("form.error.email_failed", "Your message could not be delivered. Please try again later."),
    ("form.error.unknown", "Something went wrong. Please try again later."),
    ("form.field.line", "  {field}: {message}"),
    ("form.field.firstName", "First name"),
    ("form.field.lastName", "Last name"),
    ("form.field.email", "Email"),
    ("form.field.subject", "Subject"),
    ("form.field.message", "Message"),
    ("form.field.company", "Company"),
    ("form.field.formStartTime", "Start time"),
    ("form.field.captchaProof", "CAPTCHA"),
    ("form.issue.Required", "Required"),
    ("form.issue.Invalid email", "Invalid email"),
    ("form.issue.Too short", "Too short"),
    ("form.issue.Expected text", "Expected text"),
    ("form.issue.Expected number", "Expected number"),
];

/// Spanish catalog.
const CATALOG_ES: &[(&str, &str)] = &[
    ("main.version", "contact-gate {version}"),
    ("config.load_failed", "No se pudo cargar la configuración: {error}"),
    ("config.check.ok", "Configuración válida."),
    ("config.check.captcha_mode", "Modo CAPTCHA: {mode}"),
    ("config.check.email_key", "Clave de API de correo: {status}"),
    ("config.check.captcha_secret", "Secreto CAPTCHA: {status}"),
    ("config.check.present", "presente"),
    ("config.check.missing", "ausente"),
    ("serve.init_failed", "No se pudo iniciar el servidor de contacto: {error}"),
    ("serve.listening", "Servidor de contacto escuchando en {bind}"),
    ("serve.failed", "El servidor de contacto falló: {error}"),
    ("submit.failed", "No se pudo contactar con el servicio: {error}"),
    ("submit.captcha.answer_required", "Este formulario requiere --answer."),
    ("submit.captcha.token_required", "Este formulario requiere --token o --token-file."),
    ("submit.captcha.widget_unavailable", "El widget CAPTCHA no estuvo listo a tiempo."),
    (
        "submit.captcha.site_key_missing",
        "El servicio de contacto no tiene configurada una clave de sitio CAPTCHA.",
    ),
    ("output.write_failed", "No se pudo escribir en {stream}: {error}"),
    ("i18n.lang.invalid_env", "Valor no válido para {env}: {value}. Se esperaba 'en' o 'es'."),
    ("form.success", "¡Gracias! Tu mensaje ha sido enviado."),
    ("form.error.validation", "Corrige los campos marcados."),
    ("form.error.bad_captcha", "La verificación CAPTCHA falló. Recarga el formulario e inténtalo de nuevo."),
    ("form.error.too_fast", "¡Qué rápido! Espera un momento e inténtalo de nuevo."),
    ("form.error.spam", "No se pudo enviar tu mensaje. Reformúlalo e inténtalo de nuevo."),
    ("form.error.email_failed", "No se pudo entregar tu mensaje. Inténtalo más tarde."),
    ("form.error.unknown", "Algo salió mal. Inténtalo más tarde."),
    ("form.field.firstName", "Nombre"),
    ("form.field.lastName", "Apellido"),
    ("form.field.email", "Correo"),
    ("form.field.subject", "Asunto"),
    ("form.field.message", "Mensaje"),
    ("form.field.company", "Empresa"),
    ("form.field.formStartTime", "Hora de inicio"),
    ("form.field.captchaProof", "CAPTCHA"),
    ("form.issue.Required", "Obligatorio"),
    ("form.issue.Invalid email", "Correo no válido"),
    ("form.issue.Too short", "Demasiado corto"),
    ("form.issue.Expected text", "Se esperaba texto"),
    ("form.issue.Expected number", "Se esperaba un número"),
];

/// Returns the message catalog for the requested locale.
fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_ES_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Es => CATALOG_ES_MAP.get_or_init(|| CATALOG_ES.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Looks up `key` without substitutions, returning `None` when no catalog has it.
#[must_use]
pub fn lookup(locale: Locale, key: &str) -> Option<&'static str> {
    catalog_for(locale).get(key).or_else(|| catalog_for(Locale::En).get(key)).copied()
}

/// Translates `key` for `locale` while substituting `args`.
#[must_use]
pub fn translate(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = lookup(locale, key).unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a localized message from a locale, key, and named arguments.
#[macro_export]
macro_rules! t {
    ($locale:expr, $key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($locale, $key, args)
    }};
}
