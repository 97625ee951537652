//! FFI module for foreign tree libraries
//!
//! This module provides C-compatible functions so that a tree library written
//! in another language can drive a parse and read the finished tree back.

use std::cell::RefCell;
use std::ffi::{c_char, c_int, c_uchar, CString};
use std::ptr;
use std::slice;

use soup5_tree::{Compat, NodeId, NodeKind};

use crate::driver::{ParseOptions, Parser, Soup};
use crate::html_parser::Html5everEngine;
use crate::links::LinkTable;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(message: String) {
    log::debug!("ffi error: {message}");
    let message = CString::new(message).unwrap_or_default();
    LAST_ERROR.with(|slot| *slot.borrow_mut() = Some(message));
}

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the library (installs the logger)
#[no_mangle]
pub extern "C" fn soup5_init() {
    let _ = env_logger::try_init();
}

/// Get library version
#[no_mangle]
pub extern "C" fn soup5_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

/// Message of the last failed call on this thread (null if none)
///
/// The pointer stays valid until the next failing call on the same thread.
#[no_mangle]
pub extern "C" fn soup5_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|message| message.as_ptr())
            .unwrap_or(ptr::null())
    })
}

// ============================================================================
// Parsing
// ============================================================================

/// Parse `length` bytes of UTF-8 HTML
///
/// `generation` selects the tree-library generation: 0 = detect, 3 = legacy,
/// 4 = modern; any other value is rejected. `stack_size` 0 means the default
/// budget. Returns null on failure; see `soup5_last_error`.
#[no_mangle]
pub extern "C" fn soup5_parse(
    data: *const c_uchar,
    length: usize,
    stack_size: usize,
    keep_doctype: c_int,
    return_root: c_int,
    generation: c_int,
) -> *mut Soup {
    if data.is_null() && length != 0 {
        set_last_error("null input buffer".to_string());
        return ptr::null_mut();
    }
    let input: &[u8] = if length == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(data, length) }
    };

    let mut parser = match generation {
        3 => Parser::with_compat(Html5everEngine::default(), Compat::legacy()),
        4 => Parser::with_compat(Html5everEngine::default(), Compat::modern()),
        0 => match Parser::new() {
            Ok(parser) => parser,
            Err(err) => {
                set_last_error(err.to_string());
                return ptr::null_mut();
            }
        },
        other => {
            set_last_error(format!("unknown tree library generation {other}"));
            return ptr::null_mut();
        }
    };

    let mut options = ParseOptions::default()
        .keep_doctype(keep_doctype != 0)
        .return_root(return_root != 0);
    if stack_size != 0 {
        options = options.stack_size(stack_size);
    }

    match parser.parse(input, options) {
        Ok(soup) => Box::into_raw(Box::new(soup)),
        Err(err) => {
            set_last_error(err.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a soup returned by `soup5_parse`
#[no_mangle]
pub extern "C" fn soup5_soup_free(soup: *mut Soup) {
    if !soup.is_null() {
        unsafe {
            drop(Box::from_raw(soup));
        }
    }
}

// ============================================================================
// Node access
// ============================================================================

/// Get the number of nodes
#[no_mangle]
pub extern "C" fn soup5_node_count(soup: *const Soup) -> u32 {
    match unsafe { soup.as_ref() } {
        Some(s) => u32::try_from(s.tree().len()).unwrap_or(u32::MAX),
        None => 0,
    }
}

/// Node selected by `return_root` (0 for a null soup)
#[no_mangle]
pub extern "C" fn soup5_node(soup: *const Soup) -> u32 {
    match unsafe { soup.as_ref() } {
        Some(s) => s.node().to_raw(),
        None => 0,
    }
}

/// Document container id (0 for a null soup)
#[no_mangle]
pub extern "C" fn soup5_document(soup: *const Soup) -> u32 {
    match unsafe { soup.as_ref() } {
        Some(s) => s.document().to_raw(),
        None => 0,
    }
}

/// Node kind (`NodeType` discriminant), 255 for an unknown node
#[no_mangle]
pub extern "C" fn soup5_node_kind(soup: *const Soup, node: u32) -> u8 {
    let kind = unsafe { soup.as_ref() }
        .zip(NodeId::from_raw(node))
        .and_then(|(s, id)| s.tree().kind(id).map(|k| k.node_type() as u8));
    kind.unwrap_or(u8::MAX)
}

/// Tag name, text, comment or doctype declaration of a node
///
/// Returns a newly allocated string to be released with `soup5_string_free`,
/// or null.
#[no_mangle]
pub extern "C" fn soup5_node_value(soup: *const Soup, node: u32) -> *mut c_char {
    let Some((s, id)) = unsafe { soup.as_ref() }.zip(NodeId::from_raw(node)) else {
        return ptr::null_mut();
    };
    let value = match s.tree().kind(id) {
        Some(NodeKind::Element(el)) => el.name.clone(),
        Some(NodeKind::Text(text)) | Some(NodeKind::Comment(text)) => text.clone(),
        Some(NodeKind::Doctype(dt)) => dt.declaration(),
        Some(NodeKind::Document) | None => return ptr::null_mut(),
    };
    match CString::new(value) {
        Ok(c_string) => c_string.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Attribute value of an element, or null; free with `soup5_string_free`
#[no_mangle]
pub extern "C" fn soup5_node_attr(soup: *const Soup, node: u32, name: *const c_char) -> *mut c_char {
    if name.is_null() {
        return ptr::null_mut();
    }
    let Some((s, id)) = unsafe { soup.as_ref() }.zip(NodeId::from_raw(node)) else {
        return ptr::null_mut();
    };
    let Ok(name) = unsafe { std::ffi::CStr::from_ptr(name) }.to_str() else {
        return ptr::null_mut();
    };
    let value = s
        .tree()
        .get(id)
        .and_then(|n| n.attrs())
        .and_then(|attrs| attrs.get(name))
        .and_then(|v| CString::new(v).ok());
    match value {
        Some(c_string) => c_string.into_raw(),
        None => ptr::null_mut(),
    }
}

/// Free a string returned by this library
#[no_mangle]
pub extern "C" fn soup5_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}

// ============================================================================
// Link table
// ============================================================================

/// Write the flat link table of a soup to a newly allocated buffer
///
/// Returns 1 on success; the buffer must be released with
/// `soup5_buffer_free`.
#[no_mangle]
pub extern "C" fn soup5_link_table(
    soup: *const Soup,
    buffer: *mut *mut c_uchar,
    length: *mut usize,
) -> c_int {
    if buffer.is_null() || length.is_null() {
        return 0;
    }
    let Some(s) = (unsafe { soup.as_ref() }) else {
        return 0;
    };

    let table = LinkTable::from_tree(s.tree());
    let bytes = table.as_bytes();
    unsafe {
        // Allocate at least one byte so an empty table still yields a
        // pointer the caller can free
        let ptr = libc::malloc(bytes.len().max(1)) as *mut c_uchar;
        if ptr.is_null() {
            return 0;
        }
        ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
        *buffer = ptr;
        *length = bytes.len();
    }
    1
}

/// Free a buffer allocated by `soup5_link_table`
#[no_mangle]
pub extern "C" fn soup5_buffer_free(buffer: *mut c_uchar) {
    if !buffer.is_null() {
        unsafe {
            libc::free(buffer as *mut libc::c_void);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    fn parse(html: &str, generation: c_int) -> *mut Soup {
        soup5_parse(html.as_ptr(), html.len(), 0, 1, 1, generation)
    }

    fn take_string(s: *mut c_char) -> Option<String> {
        if s.is_null() {
            return None;
        }
        let value = unsafe { CStr::from_ptr(s) }.to_string_lossy().into_owned();
        soup5_string_free(s);
        Some(value)
    }

    #[test]
    fn test_parse_and_read_nodes() {
        soup5_init();
        let soup = parse("<p id=\"x\">Hi</p>", 4);
        assert!(!soup.is_null());

        let root = soup5_node(soup);
        assert_eq!(soup5_node_kind(soup, root), 1);
        assert_eq!(take_string(soup5_node_value(soup, root)).as_deref(), Some("html"));
        // document, html, head, body, p, text
        assert_eq!(soup5_node_count(soup), 6);

        let p = (1..=soup5_node_count(soup))
            .find(|&id| take_string(soup5_node_value(soup, id)).as_deref() == Some("p"))
            .unwrap();
        let attr = soup5_node_attr(soup, p, c"id".as_ptr());
        assert_eq!(take_string(attr).as_deref(), Some("x"));
        assert!(soup5_node_attr(soup, p, c"class".as_ptr()).is_null());

        soup5_soup_free(soup);
    }

    #[test]
    fn test_link_table_export() {
        let soup = parse("<b>x</b>", 3);
        let mut buffer: *mut c_uchar = ptr::null_mut();
        let mut length = 0usize;
        assert_eq!(soup5_link_table(soup, &mut buffer, &mut length), 1);

        let bytes = unsafe { slice::from_raw_parts(buffer, length) };
        let table = LinkTable::from_bytes(bytes).unwrap();
        assert_eq!(table.len(), soup5_node_count(soup) as usize);
        let document = soup5_document(soup);
        assert_eq!(table.records[document as usize - 1].next_element, soup5_node(soup));

        soup5_buffer_free(buffer);
        soup5_soup_free(soup);
    }

    #[test]
    fn test_null_arguments() {
        assert!(soup5_parse(ptr::null(), 4, 0, 0, 1, 4).is_null());
        assert!(!soup5_last_error().is_null());
        assert_eq!(soup5_node_count(ptr::null()), 0);
        assert_eq!(soup5_node_kind(ptr::null(), 1), u8::MAX);
        assert!(soup5_node_value(ptr::null(), 1).is_null());
        soup5_soup_free(ptr::null_mut());
        soup5_string_free(ptr::null_mut());
        soup5_buffer_free(ptr::null_mut());
    }

    #[test]
    fn test_unknown_generation_is_rejected() {
        let html = "<p>x</p>";
        for generation in [5, -1] {
            let soup = soup5_parse(html.as_ptr(), html.len(), 0, 0, 1, generation);
            assert!(soup.is_null());
            let message = unsafe { CStr::from_ptr(soup5_last_error()) };
            assert_eq!(
                message.to_str().unwrap(),
                format!("unknown tree library generation {generation}")
            );
        }

        let soup = soup5_parse(html.as_ptr(), html.len(), 0, 0, 1, 0);
        assert!(!soup.is_null());
        soup5_soup_free(soup);
    }

    #[test]
    fn test_version_is_nul_terminated() {
        let version = unsafe { CStr::from_ptr(soup5_version()) };
        assert_eq!(version.to_str().unwrap(), env!("CARGO_PKG_VERSION"));
    }
}
