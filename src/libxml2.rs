//! LibXML2 FFI Wrapper Module
//!
//! Streaming XML Schema validation on top of libxml2.
//!
//! No mature pure Rust library validates XML against XSD (roxmltree, quick-xml
//! and xml-rs parse but do not validate), so schema validation is delegated to
//! libxml2 through direct FFI.
//!
//! Documents are never built into a tree. `xmlSchemaValidateStream` runs the
//! SAX2 parser with the schema validator plugged in beside our handler, so
//! element, text and diagnostic callbacks arrive in document order, each
//! diagnostic at the point the validator detects it. The callbacks forward
//! into a [`RecordEvents`] listener.
//!
//! The plug hands each SAX event to our handler before the validator sees it,
//! so start and end tags are held back until the next parser event.
//! Diagnostics raised on a start tag (missing attributes, unexpected
//! elements) then precede its `element_enter` and land on the enclosing
//! element. Diagnostics raised on an end tag (missing children, bad content)
//! precede the `element_exit` of the element they belong to.
//!
//! ## Callback context
//!
//! The schema plug replaces the parser's user data with its own state, so the
//! pointer handed to error callbacks is not always ours. Every callback
//! resolves the active stream through a thread-local set for the duration of
//! the validation call instead. Validation is synchronous and never reentrant,
//! so at most one stream is active per thread.
//!
//! Validity errors arrive through the validation context's structured error
//! handler. Well-formedness errors arrive through libxml2's per-thread
//! structured handler, which is pointed at the same callback for the call.

use std::borrow::Cow;
use std::cell::Cell;
use std::ffi::{CStr, CString};
use std::io::{self, Read};
use std::marker::PhantomData;
use std::path::Path;
use std::ptr;
use std::sync::{Arc, Once};

use libc::{c_char, c_int, c_uint, c_void};
use log::debug;

use crate::error::{LibXml2Error, LibXml2Result, Result};
use crate::events::{Attributes, RecordEvents, Severity};

/// libxml2's parser and globals are initialized exactly once per process.
static LIBXML2_INIT: Once = Once::new();

const XML_SAX2_MAGIC: c_uint = 0xDEED_BEAF;

const XML_ERR_WARNING: c_int = 1;
const XML_ERR_FATAL: c_int = 3;

type XmlChar = u8;

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlParserInputBuffer {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *const XmlError)>;

type XmlInputReadCallback =
    Option<unsafe extern "C" fn(context: *mut c_void, buffer: *mut c_char, len: c_int) -> c_int>;

type XmlInputCloseCallback = Option<unsafe extern "C" fn(context: *mut c_void) -> c_int>;

type StartElementNsFunc = unsafe extern "C" fn(
    ctx: *mut c_void,
    localname: *const XmlChar,
    prefix: *const XmlChar,
    uri: *const XmlChar,
    nb_namespaces: c_int,
    namespaces: *mut *const XmlChar,
    nb_attributes: c_int,
    nb_defaulted: c_int,
    attributes: *mut *const XmlChar,
);

type EndElementNsFunc = unsafe extern "C" fn(
    ctx: *mut c_void,
    localname: *const XmlChar,
    prefix: *const XmlChar,
    uri: *const XmlChar,
);

type CharactersFunc = unsafe extern "C" fn(ctx: *mut c_void, ch: *const XmlChar, len: c_int);

/// Placeholder for SAX slots we leave empty; only ever `None`.
type UnusedSaxFunc = Option<unsafe extern "C" fn()>;

/// `xmlSAXHandler`, SAX2 layout
#[repr(C)]
struct XmlSaxHandler {
    internal_subset: UnusedSaxFunc,
    is_standalone: UnusedSaxFunc,
    has_internal_subset: UnusedSaxFunc,
    has_external_subset: UnusedSaxFunc,
    resolve_entity: UnusedSaxFunc,
    get_entity: UnusedSaxFunc,
    entity_decl: UnusedSaxFunc,
    notation_decl: UnusedSaxFunc,
    attribute_decl: UnusedSaxFunc,
    element_decl: UnusedSaxFunc,
    unparsed_entity_decl: UnusedSaxFunc,
    set_document_locator: UnusedSaxFunc,
    start_document: UnusedSaxFunc,
    end_document: UnusedSaxFunc,
    start_element: UnusedSaxFunc,
    end_element: UnusedSaxFunc,
    reference: UnusedSaxFunc,
    characters: Option<CharactersFunc>,
    ignorable_whitespace: Option<CharactersFunc>,
    processing_instruction: UnusedSaxFunc,
    comment: UnusedSaxFunc,
    warning: UnusedSaxFunc,
    error: UnusedSaxFunc,
    fatal_error: UnusedSaxFunc,
    get_parameter_entity: UnusedSaxFunc,
    cdata_block: Option<CharactersFunc>,
    external_subset: UnusedSaxFunc,
    initialized: c_uint,
    private: *mut c_void,
    start_element_ns: Option<StartElementNsFunc>,
    end_element_ns: Option<EndElementNsFunc>,
    serror: XmlStructuredErrorFunc,
}

impl XmlSaxHandler {
    fn for_stream() -> Self {
        Self {
            internal_subset: None,
            is_standalone: None,
            has_internal_subset: None,
            has_external_subset: None,
            resolve_entity: None,
            get_entity: None,
            entity_decl: None,
            notation_decl: None,
            attribute_decl: None,
            element_decl: None,
            unparsed_entity_decl: None,
            set_document_locator: None,
            start_document: None,
            end_document: None,
            start_element: None,
            end_element: None,
            reference: None,
            characters: Some(characters_callback),
            ignorable_whitespace: Some(characters_callback),
            processing_instruction: None,
            comment: None,
            warning: None,
            error: None,
            fatal_error: None,
            get_parameter_entity: None,
            cdata_block: Some(characters_callback),
            external_subset: None,
            initialized: XML_SAX2_MAGIC,
            private: ptr::null_mut(),
            start_element_ns: Some(start_element_ns_callback),
            end_element_ns: Some(end_element_ns_callback),
            serror: Some(stream_error_callback),
        }
    }
}

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    fn xmlInitParser();
    fn xmlInitGlobals();
    fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: XmlStructuredErrorFunc);

    // Schema parsing functions
    fn xmlSchemaNewMemParserCtxt(buffer: *const c_char, size: c_int) -> *mut XmlSchemaParserCtxt;
    fn xmlSchemaNewParserCtxt(url: *const c_char) -> *mut XmlSchemaParserCtxt;
    fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation functions
    fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );

    // Streaming input
    fn xmlParserInputBufferCreateIO(
        ioread: XmlInputReadCallback,
        ioclose: XmlInputCloseCallback,
        ioctx: *mut c_void,
        enc: c_int,
    ) -> *mut XmlParserInputBuffer;
    fn xmlSchemaValidateStream(
        ctxt: *mut XmlSchemaValidCtxt,
        input: *mut XmlParserInputBuffer,
        enc: c_int,
        sax: *mut XmlSaxHandler,
        user_data: *mut c_void,
    ) -> c_int;
}

/// Character encoding handed to the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CharEncoding {
    /// Let libxml2 detect the encoding from the byte order mark and XML declaration
    #[default]
    Detect,
    /// Input is known to be UTF-8, whatever the declaration says
    Utf8,
}

impl CharEncoding {
    fn as_raw(self) -> c_int {
        match self {
            CharEncoding::Detect => 0,
            CharEncoding::Utf8 => 1,
        }
    }
}

/// How a stream validation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The whole input was parsed; validity errors were delivered as diagnostics
    Completed,
    /// The parser stopped at a fatal error
    Aborted { message: String },
}

/// Thread-safe wrapper for a parsed libxml2 schema with proper resource management
#[derive(Debug)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: parsed xmlSchema structures are read-only during validation
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// The pointer must come from `xmlSchemaParse` and must not be freed elsewhere.
    pub(crate) unsafe fn from_raw(ptr: *mut XmlSchema) -> LibXml2Result<Self> {
        if ptr.is_null() {
            return Err(LibXml2Error::SchemaParseFailed {
                details: "null schema returned".to_string(),
            });
        }

        Ok(XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }

}

impl Clone for XmlSchemaPtr {
    fn clone(&self) -> Self {
        XmlSchemaPtr {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = ptr::null_mut();
        }
    }
}

/// State shared with the libxml2 callbacks for one validation call
struct StreamContext<'a> {
    input: &'a mut dyn Read,
    events: &'a mut (dyn RecordEvents + 'a),
    /// First I/O error from the input or the listener; stops delivery
    failure: Option<io::Error>,
    /// First fatal parser message
    fatal: Option<String>,
    /// Tag seen but not yet delivered
    held: Option<HeldTag>,
}

/// A start or end tag whose delivery waits for the next parser event.
///
/// The schema plug hands each tag to the SAX handler before the validator
/// checks it, so the validator's complaints about a tag arrive after it.
/// Holding the tag back lets them reach the listener first: start-tag
/// diagnostics then belong to the enclosing element, end-tag diagnostics to
/// the element being closed.
enum HeldTag {
    Start { name: String, attributes: Attributes },
    End { name: String },
}

impl<'a> StreamContext<'a> {
    fn hold(&mut self, tag: HeldTag) {
        self.release_held();
        self.held = Some(tag);
    }

    fn release_held(&mut self) {
        match self.held.take() {
            Some(HeldTag::Start { name, attributes }) => {
                self.deliver(|events| events.element_enter(&name, &attributes))
            }
            Some(HeldTag::End { name }) => self.deliver(|events| events.element_exit(&name)),
            None => {}
        }
    }

    fn deliver(&mut self, event: impl FnOnce(&mut (dyn RecordEvents + 'a)) -> io::Result<()>) {
        if self.failure.is_some() {
            return;
        }
        if let Err(err) = event(&mut *self.events) {
            self.failure = Some(err);
        }
    }
}

thread_local! {
    static ACTIVE_STREAM: Cell<*mut c_void> = const { Cell::new(ptr::null_mut()) };
}

/// Marks a stream context active on this thread until dropped
struct ActiveStream {
    previous: *mut c_void,
}

impl ActiveStream {
    fn enter(context: *mut c_void) -> Self {
        let previous = ACTIVE_STREAM.with(|active| active.replace(context));
        Self { previous }
    }
}

impl Drop for ActiveStream {
    fn drop(&mut self) {
        ACTIVE_STREAM.with(|active| active.set(self.previous));
    }
}

fn with_active_stream(f: impl FnOnce(&mut StreamContext<'_>)) {
    let context = ACTIVE_STREAM.with(|active| active.get());
    if context.is_null() {
        return;
    }
    // Safety: the pointer is set by `validate_stream` for the duration of the
    // libxml2 call and refers to a live StreamContext on its stack.
    let stream = unsafe { &mut *(context as *mut StreamContext<'_>) };
    f(stream);
}

unsafe fn xml_str<'a>(s: *const XmlChar) -> Cow<'a, str> {
    if s.is_null() {
        return Cow::Borrowed("");
    }
    unsafe { CStr::from_ptr(s as *const c_char) }.to_string_lossy()
}

unsafe fn xml_slice<'a>(s: *const XmlChar, len: usize) -> Cow<'a, str> {
    if s.is_null() || len == 0 {
        return Cow::Borrowed("");
    }
    String::from_utf8_lossy(unsafe { std::slice::from_raw_parts(s, len) })
}

unsafe extern "C" fn start_element_ns_callback(
    _ctx: *mut c_void,
    localname: *const XmlChar,
    _prefix: *const XmlChar,
    _uri: *const XmlChar,
    _nb_namespaces: c_int,
    _namespaces: *mut *const XmlChar,
    nb_attributes: c_int,
    _nb_defaulted: c_int,
    attributes: *mut *const XmlChar,
) {
    let name = unsafe { xml_str(localname) };

    // Five pointers per attribute: localname, prefix, URI, value start, value end
    let mut attrs = Attributes::new();
    if !attributes.is_null() {
        for i in 0..nb_attributes.max(0) as usize {
            let (local, start, end) = unsafe {
                let base = attributes.add(i * 5);
                (*base, *base.add(3), *base.add(4))
            };
            let len = if start.is_null() || end.is_null() {
                0
            } else {
                unsafe { end.offset_from(start) }.max(0) as usize
            };
            attrs.push(unsafe { xml_str(local) }, unsafe { xml_slice(start, len) });
        }
    }

    with_active_stream(|stream| {
        stream.hold(HeldTag::Start {
            name: name.into_owned(),
            attributes: attrs,
        });
    });
}

unsafe extern "C" fn end_element_ns_callback(
    _ctx: *mut c_void,
    localname: *const XmlChar,
    _prefix: *const XmlChar,
    _uri: *const XmlChar,
) {
    let name = unsafe { xml_str(localname) };
    with_active_stream(|stream| {
        stream.hold(HeldTag::End {
            name: name.into_owned(),
        });
    });
}

unsafe extern "C" fn characters_callback(_ctx: *mut c_void, ch: *const XmlChar, len: c_int) {
    let text = unsafe { xml_slice(ch, len.max(0) as usize) };
    with_active_stream(|stream| {
        stream.release_held();
        stream.deliver(|events| events.character_data(&text));
    });
}

/// Reports parser and validator errors to the active stream
unsafe extern "C" fn stream_error_callback(_user_data: *mut c_void, error: *const XmlError) {
    if error.is_null() {
        return;
    }
    let (level, msg_ptr) = unsafe { ((*error).level, (*error).message) };
    if msg_ptr.is_null() {
        return;
    }
    let message = unsafe { CStr::from_ptr(msg_ptr) }
        .to_string_lossy()
        .trim()
        .to_string();
    let severity = match level {
        XML_ERR_WARNING => Severity::Warning,
        XML_ERR_FATAL => Severity::Fatal,
        _ => Severity::Error,
    };

    with_active_stream(|stream| {
        if severity == Severity::Fatal && stream.fatal.is_none() {
            stream.fatal = Some(message.clone());
        }
        stream.deliver(|events| events.diagnostic(severity, &message));
    });
}

/// Collects messages into the `Vec<String>` passed as user data
unsafe extern "C" fn collect_messages_callback(user_data: *mut c_void, error: *const XmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }
    let messages = unsafe { &mut *(user_data as *mut Vec<String>) };
    let msg_ptr = unsafe { (*error).message };
    if !msg_ptr.is_null() {
        let c_str = unsafe { CStr::from_ptr(msg_ptr) };
        messages.push(c_str.to_string_lossy().trim().to_string());
    }
}

unsafe extern "C" fn read_callback(context: *mut c_void, buffer: *mut c_char, len: c_int) -> c_int {
    if context.is_null() || buffer.is_null() || len <= 0 {
        return 0;
    }
    let stream = unsafe { &mut *(context as *mut StreamContext<'_>) };
    // A listener failure ends the input so the parser stops early.
    if stream.failure.is_some() {
        return -1;
    }

    let buf = unsafe { std::slice::from_raw_parts_mut(buffer as *mut u8, len as usize) };
    loop {
        match stream.input.read(buf) {
            Ok(n) => return n as c_int,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                stream.failure = Some(err);
                return -1;
            }
        }
    }
}

/// Safe access to libxml2 schema parsing and streaming validation
pub struct LibXml2Wrapper {
    _phantom: PhantomData<()>,
}

impl LibXml2Wrapper {
    /// Create a wrapper, initializing libxml2 on first use
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        LibXml2Wrapper {
            _phantom: PhantomData,
        }
    }

    /// Parse an XML schema from a memory buffer.
    ///
    /// Schema parsing is not thread-safe in libxml2; parse once and share the
    /// resulting [`XmlSchemaPtr`].
    pub fn parse_schema_from_memory(&self, schema_data: &[u8]) -> LibXml2Result<XmlSchemaPtr> {
        let size = c_int::try_from(schema_data.len()).map_err(|_| LibXml2Error::MemoryAllocation)?;

        unsafe {
            let parser_ctxt =
                xmlSchemaNewMemParserCtxt(schema_data.as_ptr() as *const c_char, size);
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }
            Self::parse_with(parser_ctxt)
        }
    }

    /// Parse an XML schema from a file, resolving includes relative to it
    pub fn parse_schema_from_path(&self, path: &Path) -> LibXml2Result<XmlSchemaPtr> {
        let c_path = path
            .to_str()
            .and_then(|s| CString::new(s).ok())
            .ok_or_else(|| LibXml2Error::SchemaParseFailed {
                details: format!("unusable schema path: {}", path.display()),
            })?;

        unsafe {
            let parser_ctxt = xmlSchemaNewParserCtxt(c_path.as_ptr());
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }
            Self::parse_with(parser_ctxt)
        }
    }

    /// # Safety
    ///
    /// `parser_ctxt` must be a fresh schema parser context; it is freed here.
    unsafe fn parse_with(parser_ctxt: *mut XmlSchemaParserCtxt) -> LibXml2Result<XmlSchemaPtr> {
        let mut messages: Vec<String> = Vec::new();

        let schema_ptr = unsafe {
            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(collect_messages_callback),
                &mut messages as *mut Vec<String> as *mut c_void,
            );
            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);
            schema_ptr
        };

        if schema_ptr.is_null() {
            let details = if messages.is_empty() {
                "null schema returned".to_string()
            } else {
                messages.join("; ")
            };
            return Err(LibXml2Error::SchemaParseFailed { details });
        }

        unsafe { XmlSchemaPtr::from_raw(schema_ptr) }
    }

    /// Validate a document read from `input`, pushing its events into `events`.
    ///
    /// Validity errors do not stop the parse; they reach `events` as
    /// diagnostics. A fatal parser error ends the parse and is returned as
    /// [`StreamOutcome::Aborted`]. Errors from `input` or from `events` are
    /// returned as I/O errors.
    pub fn validate_stream(
        &self,
        schema: &XmlSchemaPtr,
        input: &mut dyn Read,
        encoding: CharEncoding,
        events: &mut dyn RecordEvents,
    ) -> Result<StreamOutcome> {
        let mut stream = StreamContext {
            input,
            events,
            failure: None,
            fatal: None,
            held: None,
        };
        let stream_ptr = &mut stream as *mut StreamContext<'_> as *mut c_void;
        let mut sax = XmlSaxHandler::for_stream();

        let code = unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                return Err(LibXml2Error::ValidationContextCreationFailed.into());
            }
            xmlSchemaSetValidStructuredErrors(valid_ctxt, Some(stream_error_callback), stream_ptr);

            let buffer = xmlParserInputBufferCreateIO(
                Some(read_callback),
                None,
                stream_ptr,
                encoding.as_raw(),
            );
            if buffer.is_null() {
                xmlSchemaFreeValidCtxt(valid_ctxt);
                return Err(LibXml2Error::InputBufferCreationFailed.into());
            }

            // Well-formedness errors bypass the SAX handler's `serror` once the
            // schema plug is installed and go to the per-thread handler instead.
            let _active = ActiveStream::enter(stream_ptr);
            xmlSetStructuredErrorFunc(stream_ptr, Some(stream_error_callback));

            // The parser takes ownership of the input buffer.
            let code =
                xmlSchemaValidateStream(valid_ctxt, buffer, encoding.as_raw(), &mut sax, stream_ptr);

            xmlSetStructuredErrorFunc(ptr::null_mut(), None);
            xmlSchemaFreeValidCtxt(valid_ctxt);
            code
        };
        stream.release_held();
        debug!("xmlSchemaValidateStream returned {}", code);

        if let Some(err) = stream.failure {
            return Err(err.into());
        }
        if let Some(message) = stream.fatal {
            return Ok(StreamOutcome::Aborted { message });
        }
        if code < 0 {
            return Err(LibXml2Error::InternalError { code }.into());
        }
        Ok(StreamOutcome::Completed)
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}
