//! C FFI bindings for deck-core
//!
//! This crate provides a C-compatible API for GUI hosts. Every function takes
//! and returns NUL-terminated UTF-8 strings; returned strings are owned by
//! Rust and must be released with `deck_free_string`. Errors are reported as
//! a null return.

use deck_core::{
    decode_input, import_bytes, write_list, Dialect, FormatGuesser, ImportConfig, MemoryCatalog,
    StrictPolicy,
};
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

unsafe fn to_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

fn into_c_string(s: &str) -> *mut c_char {
    CString::new(s)
        .ok()
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

/// Number of supported dialects
#[no_mangle]
pub extern "C" fn deck_dialect_count() -> usize {
    Dialect::ALL.len()
}

/// Name of a dialect by index, in guess order
///
/// Returns null if index is out of bounds. Caller must free the returned
/// string with `deck_free_string`.
#[no_mangle]
pub extern "C" fn deck_dialect_name(index: usize) -> *mut c_char {
    deck_core::guess_order()
        .get(index)
        .map(|d| into_c_string(d.name()))
        .unwrap_or(ptr::null_mut())
}

/// Detect the dialect of a deck file's contents
///
/// # Safety
/// - `input` must be a valid C string
/// - Returns null if no dialect accepts the input
/// - Caller must free the returned string with `deck_free_string`
#[no_mangle]
pub unsafe extern "C" fn deck_guess_dialect(input: *const c_char) -> *mut c_char {
    let Some(input) = to_str(input) else {
        return ptr::null_mut();
    };

    match FormatGuesser::new().guess(&decode_input(input.as_bytes())) {
        Ok((dialect, _)) => into_c_string(dialect.name()),
        Err(e) => {
            log::debug!("deck_guess_dialect: {}", e);
            ptr::null_mut()
        }
    }
}

/// Convert a deck file's contents to another dialect
///
/// Names are resolved strictly against the catalog: any unknown or ambiguous
/// name makes the conversion fail.
///
/// # Safety
/// - `catalog_path`, `input` and `dialect` must be valid C strings
/// - Returns null on error
/// - Caller must free the returned string with `deck_free_string`
#[no_mangle]
pub unsafe extern "C" fn deck_convert(
    catalog_path: *const c_char,
    input: *const c_char,
    dialect: *const c_char,
) -> *mut c_char {
    let (Some(catalog_path), Some(input), Some(dialect)) =
        (to_str(catalog_path), to_str(input), to_str(dialect))
    else {
        return ptr::null_mut();
    };

    let result = dialect.parse::<Dialect>().and_then(|dialect| {
        let catalog = MemoryCatalog::load(catalog_path)?;
        let (_, list) = import_bytes(
            input.as_bytes(),
            &catalog,
            &mut StrictPolicy,
            &ImportConfig::default(),
        )?;
        write_list(&list, dialect)
    });

    match result {
        Ok(text) => into_c_string(&text),
        Err(e) => {
            log::warn!("deck_convert: {}", e);
            ptr::null_mut()
        }
    }
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by a deck_* function or null
#[no_mangle]
pub unsafe extern "C" fn deck_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CATALOG: &str = r#"{
        "cards": [
            {"name": "Abebe", "card_types": ["Vampire"], "capacity": 4},
            {"name": ".44 Magnum", "card_types": ["Equipment"]}
        ]
    }"#;

    unsafe fn take(s: *mut c_char) -> Option<String> {
        if s.is_null() {
            return None;
        }
        let text = CStr::from_ptr(s).to_str().unwrap().to_string();
        deck_free_string(s);
        Some(text)
    }

    #[test]
    fn test_dialect_names() {
        assert_eq!(deck_dialect_count(), 14);
        unsafe {
            assert_eq!(take(deck_dialect_name(0)).as_deref(), Some("sutekh-card-set"));
            assert_eq!(take(deck_dialect_name(13)).as_deref(), Some("jol"));
            assert!(deck_dialect_name(14).is_null());
        }
    }

    #[test]
    fn test_guess_dialect() {
        let input = CString::new("4\t.44 Magnum\nCrypt:\n2\tAbebe\n").unwrap();
        unsafe {
            assert_eq!(take(deck_guess_dialect(input.as_ptr())).as_deref(), Some("lackey"));
            assert!(deck_guess_dialect(ptr::null()).is_null());
        }
    }

    #[test]
    fn test_convert() {
        let dir = std::env::temp_dir().join(format!("deck-ffi-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let catalog_path = dir.join("cards.json");
        fs::write(&catalog_path, CATALOG).unwrap();

        let path = CString::new(catalog_path.to_str().unwrap()).unwrap();
        let input = CString::new("2x Abebe\n4x .44 Magnum\n").unwrap();
        let lackey = CString::new("lackey").unwrap();
        let bogus = CString::new("not-a-dialect").unwrap();

        unsafe {
            let text = take(deck_convert(path.as_ptr(), input.as_ptr(), lackey.as_ptr()));
            assert_eq!(text.as_deref(), Some("4\t.44 Magnum\nCrypt:\n2\tAbebe\n"));
            assert!(deck_convert(path.as_ptr(), input.as_ptr(), bogus.as_ptr()).is_null());
        }

        let _ = fs::remove_dir_all(&dir);
    }
}
