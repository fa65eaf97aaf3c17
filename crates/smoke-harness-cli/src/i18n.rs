// crates/smoke-harness-cli/src/i18n.rs
// ============================================================================
// Module: CLI Internationalization Helpers
// Description: Message catalog and translation utilities for the CLI.
// Purpose: Centralize user-facing strings so every locale stays in parity.
// Dependencies: Standard library collections and formatting utilities.
// ============================================================================

//! ## Overview
//! Every line the harness prints for an operator (PASS/FAIL results,
//! summaries, warnings, errors) lives in a small translation catalog and is
//! rendered through the [`t!`](crate::t) macro.
//!
//! ## Invariants
//! - The locale is chosen once per process and read-only thereafter.
//! - Missing keys fall back to English and then to the key itself.
//! - Placeholder substitutions preserve deterministic order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Supported CLI locales.
///
/// # Invariants
/// - Variants are stable for CLI parsing and catalog lookup.
/// - [`Locale::En`] is the default fallback locale.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Locale {
    /// English (default).
    En,
    /// Catalan.
    Ca,
}

impl Locale {
    /// Returns the canonical locale label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ca => "ca",
        }
    }

    /// Parses a locale value (case-insensitive, tolerant of region tags).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.split(['-', '_']).next().unwrap_or_default() {
            "en" => Some(Self::En),
            "ca" => Some(Self::Ca),
            _ => None,
        }
    }
}

/// Ordered list of supported CLI locales.
pub const SUPPORTED_LOCALES: &[Locale] = &[Locale::En, Locale::Ca];

/// A formatted message argument captured by the [`macro@crate::t`] macro.
///
/// # Invariants
/// - `key` matches a placeholder name without braces (for example, `url`).
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name used in message templates.
    pub key: &'static str,
    /// Preformatted value substituted for the placeholder.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`] from a key and displayable value.
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Locale Selection
// ============================================================================

/// Process-wide locale selection for CLI output.
static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Sets the CLI locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// Returns the current CLI locale (defaults to English).
#[must_use]
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or(Locale::En)
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// English catalog entries.
const CATALOG_EN: &[(&str, &str)] = &[
    ("main.version", "smoke-harness {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("i18n.lang.invalid_env", "Invalid value for {env}: {value}. Expected 'en' or 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Note: non-English output is machine-translated and may be inaccurate.",
    ),
    ("config.load_failed", "Failed to load harness file: {error}"),
    ("config.env_failed", "Invalid environment override: {error}"),
    ("config.valid", "Harness file valid for {name}."),
    ("init.written", "Example harness file written to {path}."),
    ("init.exists", "Refusing to overwrite {path}; pass --force to replace it."),
    ("init.write_failed", "Failed to write {path}: {error}"),
    ("container.failed", "Container command failed: {error}"),
    ("build.ok", "Image {image} built."),
    ("down.ok", "Container {name} stopped and removed."),
    ("up.started", "Container {name} started; waiting for {marker} (timeout {timeout})."),
    ("up.ready", "{name} is ready after {elapsed} ({polls} log reads)."),
    ("up.marker_invalid", "Invalid readiness marker: {error}"),
    ("up.not_ready", "Readiness wait failed: {error}"),
    ("test.no_command", "No container.test_command is configured for {name}."),
    ("test.failed", "Container smoke command exited with status {code}."),
    ("test.ok", "Container smoke command passed."),
    ("run_local.no_command", "No app.run_command is configured for {name}."),
    ("run_local.exit", "Application exited with status {code}."),
    ("discover.none", "No base URL candidates available; set {env} or app.candidates."),
    ("discover.failed", "Base URL discovery failed: {error}"),
    ("smoke.base_url", "Testing {name} at {url}"),
    ("smoke.no_checks", "No smoke cases or browser steps are configured for {name}."),
    ("smoke.transport_failed", "Failed to initialize the HTTP client: {error}"),
    ("smoke.browser_failed", "Failed to initialize the WebDriver client: {error}"),
    ("smoke.case.pass", "PASS [{index}] {description} ({actual})"),
    ("smoke.case.fail", "FAIL [{index}] {description}: {reason}"),
    ("smoke.summary.pass", "All {count} checks passed in {elapsed}."),
    ("smoke.summary.fail", "Smoke test failed at check {index} of {total} after {elapsed}."),
    (
        "smoke.warn.unvalidated",
        "Warning: no base URL candidate responded; falling back to unvalidated {url}",
    ),
    ("smoke.warn.session_leak", "Warning: failed to close browser session {session}: {error}"),
    ("cycle.teardown_failed", "Teardown failed: {error}"),
];

/// Catalan catalog entries.
const CATALOG_CA: &[(&str, &str)] = &[
    ("main.version", "smoke-harness {version}"),
    ("output.stream.stdout", "sortida estàndard"),
    ("output.stream.stderr", "sortida d'error"),
    ("output.stream.unknown", "sortida"),
    ("output.write_failed", "No s'ha pogut escriure a {stream}: {error}"),
    ("i18n.lang.invalid_env", "Valor no vàlid per a {env}: {value}. S'esperava 'en' o 'ca'."),
    (
        "i18n.disclaimer.machine_translated",
        "Nota: la sortida que no és en anglès està traduïda automàticament i pot ser inexacta.",
    ),
    ("config.load_failed", "No s'ha pogut carregar el fitxer de l'arnès: {error}"),
    ("config.env_failed", "Valor d'entorn no vàlid: {error}"),
    ("config.valid", "Fitxer de l'arnès vàlid per a {name}."),
    ("init.written", "Fitxer d'exemple de l'arnès escrit a {path}."),
    ("init.exists", "No es sobreescriu {path}; feu servir --force per reemplaçar-lo."),
    ("init.write_failed", "No s'ha pogut escriure {path}: {error}"),
    ("container.failed", "L'ordre del contenidor ha fallat: {error}"),
    ("build.ok", "Imatge {image} construïda."),
    ("down.ok", "Contenidor {name} aturat i eliminat."),
    (
        "up.started",
        "Contenidor {name} iniciat; s'espera {marker} (temps límit {timeout}).",
    ),
    ("up.ready", "{name} és a punt després de {elapsed} ({polls} lectures del registre)."),
    ("up.marker_invalid", "Marcador de disponibilitat no vàlid: {error}"),
    ("up.not_ready", "L'espera de disponibilitat ha fallat: {error}"),
    ("test.no_command", "No hi ha cap container.test_command configurat per a {name}."),
    ("test.failed", "L'ordre de prova del contenidor ha acabat amb l'estat {code}."),
    ("test.ok", "L'ordre de prova del contenidor ha passat."),
    ("run_local.no_command", "No hi ha cap app.run_command configurat per a {name}."),
    ("run_local.exit", "L'aplicació ha acabat amb l'estat {code}."),
    (
        "discover.none",
        "No hi ha cap URL base candidata; definiu {env} o app.candidates.",
    ),
    ("discover.failed", "La detecció de la URL base ha fallat: {error}"),
    ("smoke.base_url", "Provant {name} a {url}"),
    ("smoke.no_checks", "No hi ha casos de prova ni passos de navegador per a {name}."),
    ("smoke.transport_failed", "No s'ha pogut inicialitzar el client HTTP: {error}"),
    ("smoke.browser_failed", "No s'ha pogut inicialitzar el client WebDriver: {error}"),
    ("smoke.case.pass", "CORRECTE [{index}] {description} ({actual})"),
    ("smoke.case.fail", "ERROR [{index}] {description}: {reason}"),
    ("smoke.summary.pass", "Les {count} comprovacions han passat en {elapsed}."),
    (
        "smoke.summary.fail",
        "La prova ha fallat a la comprovació {index} de {total} després de {elapsed}.",
    ),
    (
        "smoke.warn.unvalidated",
        "Avís: cap URL base candidata ha respost; s'utilitza {url} sense validar",
    ),
    (
        "smoke.warn.session_leak",
        "Avís: no s'ha pogut tancar la sessió del navegador {session}: {error}",
    ),
    ("cycle.teardown_failed", "El desmuntatge ha fallat: {error}"),
];

/// Returns the raw catalog entries for the requested locale.
#[must_use]
pub const fn catalog_entries_for(locale: Locale) -> &'static [(&'static str, &'static str)] {
    match locale {
        Locale::En => CATALOG_EN,
        Locale::Ca => CATALOG_CA,
    }
}

/// Returns the message catalog for the requested locale.
pub(crate) fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_EN_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static CATALOG_CA_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    match locale {
        Locale::En => CATALOG_EN_MAP.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Ca => CATALOG_CA_MAP.get_or_init(|| CATALOG_CA.iter().copied().collect()),
    }
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Translates `key` using the selected locale while substituting `args`.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let locale = current_locale();
    let template = catalog_for(locale)
        .get(key)
        .copied()
        .or_else(|| catalog_for(Locale::En).get(key).copied())
        .unwrap_or(key);
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

/// Formats a localized message from a key and named arguments.
///
/// `$key` must match a catalog entry; named arguments are substituted into
/// `{placeholder}` positions.
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
