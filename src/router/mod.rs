//! Route declarations and the route table.
//!
//! Handlers advertise routes declaratively: a [`RouteDeclaration`] pairs a
//! path with a [`MethodMask`] — a bitmask of HTTP verbs — so one declaration
//! can cover several verbs at once (`MethodMask::PUT | MethodMask::PATCH`).
//! Controller-like units implement [`RouteProvider`] and are assembled into
//! an explicit manifest at process start; [`RouteTable::build`] expands every
//! declaration into one [`RouteEntry`] per set bit and indexes the result by
//! `(verb, normalized path)`.
//!
//! Matching is case-insensitive on both verb and path and insensitive to one
//! trailing slash, so `/menus/` and `/menus` resolve to the same entry. When
//! two declarations collide on the same `(verb, path)` key, the one
//! registered last wins, silently.

use std::collections::HashMap;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;

use tracing::debug;

use crate::dispatch::Payload;
use crate::http::Method;
use crate::reply::Reply;

/// Type-erased handler invoked with the flattened request payload.
///
/// Handlers are stored behind `Arc<dyn Fn(…)>` so one declaration covering
/// several verbs can share a single callable across its expanded entries.
/// In practice you never name this type directly — pass a closure to
/// [`RouteDeclaration::new`] and let it do the wrapping.
pub type Handler = Arc<dyn Fn(Payload) -> Reply + Send + Sync + 'static>;

/// A set of HTTP verbs encoded as a bitmask.
///
/// The bit values are part of the declaration contract and must stay
/// numerically stable: GET=1, POST=2, PUT=4, PATCH=8, DELETE=16. Any
/// positive combination is a legal declaration; an empty mask is legal but
/// inert — it produces no route entries.
///
/// # Examples
///
/// ```
/// use bitroute::router::MethodMask;
///
/// let mask = MethodMask::PUT | MethodMask::PATCH;
/// assert_eq!(mask.bits(), 12);
/// assert!(mask.contains(MethodMask::PATCH));
/// assert!(!mask.contains(MethodMask::GET));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MethodMask(u32);

impl MethodMask {
    /// The empty verb set. Declarations carrying it are skipped.
    pub const NONE: MethodMask = MethodMask(0);
    pub const GET: MethodMask = MethodMask(0b0001);
    pub const POST: MethodMask = MethodMask(0b0010);
    pub const PUT: MethodMask = MethodMask(0b0100);
    pub const PATCH: MethodMask = MethodMask(0b1000);
    pub const DELETE: MethodMask = MethodMask(0b10000);

    // (bit, verb) in ascending bit order — also the expansion order.
    const VERB_BITS: [(u32, Method); 5] = [
        (0b0001, Method::Get),
        (0b0010, Method::Post),
        (0b0100, Method::Put),
        (0b1000, Method::Patch),
        (0b10000, Method::Delete),
    ];

    /// Builds a mask from a raw bit pattern, silently dropping unknown bits.
    ///
    /// Accepting raw integers keeps existing declarations expressed as plain
    /// masks (e.g. `12` for PUT+PATCH) valid.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitroute::router::MethodMask;
    ///
    /// assert_eq!(MethodMask::from_bits(12), MethodMask::PUT | MethodMask::PATCH);
    /// // Bit 6 (64) is not a known verb and is ignored.
    /// assert_eq!(MethodMask::from_bits(64), MethodMask::NONE);
    /// ```
    pub fn from_bits(raw: u32) -> Self {
        MethodMask(raw & 0b11111)
    }

    /// Returns the raw bit pattern of this mask.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if no verb bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit in `other` is also set in `self`.
    pub fn contains(self, other: MethodMask) -> bool {
        self.0 & other.0 == other.0
    }

    /// Iterates the verbs whose bits are set, in ascending bit order.
    ///
    /// # Examples
    ///
    /// ```
    /// use bitroute::router::MethodMask;
    /// use bitroute::http::Method;
    ///
    /// let verbs: Vec<Method> = (MethodMask::PUT | MethodMask::PATCH).verbs().collect();
    /// assert_eq!(verbs, vec![Method::Put, Method::Patch]);
    /// ```
    pub fn verbs(self) -> impl Iterator<Item = Method> {
        Self::VERB_BITS
            .into_iter()
            .filter(move |(bit, _)| self.0 & bit != 0)
            .map(|(_, verb)| verb)
    }
}

impl BitOr for MethodMask {
    type Output = MethodMask;

    fn bitor(self, rhs: MethodMask) -> MethodMask {
        MethodMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for MethodMask {
    fn bitor_assign(&mut self, rhs: MethodMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for MethodMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for verb in self.verbs() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(verb.as_str())?;
            first = false;
        }
        Ok(())
    }
}

/// Routing metadata attached to one handler: a path, a verb set, and the
/// handler itself.
///
/// A declaration missing its path, or whose mask decodes to zero set bits,
/// is inert: [`RouteTable::build`] skips it without error.
///
/// # Examples
///
/// ```
/// use bitroute::router::{MethodMask, RouteDeclaration};
/// use bitroute::reply::Reply;
///
/// let decl = RouteDeclaration::new("/menus", MethodMask::GET, |_payload| {
///     Reply::text("ok")
/// });
/// assert_eq!(decl.path(), Some("/menus"));
/// ```
pub struct RouteDeclaration {
    path: Option<String>,
    methods: MethodMask,
    handler: Handler,
}

impl RouteDeclaration {
    /// Declares `handler` for every verb in `methods` at `path`.
    pub fn new(
        path: impl Into<String>,
        methods: MethodMask,
        handler: impl Fn(Payload) -> Reply + Send + Sync + 'static,
    ) -> Self {
        Self {
            path: Some(path.into()),
            methods,
            handler: Arc::new(handler),
        }
    }

    /// Declares a handler without a path. Inert until a path exists; kept so
    /// a provider can stage a handler whose route is not yet decided.
    pub fn unbound(
        methods: MethodMask,
        handler: impl Fn(Payload) -> Reply + Send + Sync + 'static,
    ) -> Self {
        Self {
            path: None,
            methods,
            handler: Arc::new(handler),
        }
    }

    /// Returns the declared path, if any.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns the declared verb set.
    pub fn methods(&self) -> MethodMask {
        self.methods
    }
}

/// A unit of handlers that advertises its routes.
///
/// This is the explicit manifest replacing discovery-by-type-name: the host
/// assembles its providers into a slice at startup and hands them to
/// [`RouteTable::build`].
pub trait RouteProvider: Send + Sync {
    /// Returns this provider's route declarations.
    fn routes(&self) -> Vec<RouteDeclaration>;
}

/// One fully resolved `(single verb, path) → handler` binding.
#[derive(Clone)]
pub struct RouteEntry {
    method: Method,
    path: String,
    handler: Handler,
}

impl RouteEntry {
    /// Returns the single verb this entry answers to.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the path exactly as declared (normalization happens at lookup).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the handler bound to this entry.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("method", &self.method)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

// Lowercases and strips exactly one trailing slash. Applied to both the
// declared path at insert time and the probe at lookup time, which is what
// makes matching case- and trailing-slash-insensitive. Note the root path
// "/" normalizes to "", so a declared "/" still matches a request for "/".
fn normalize_key(path: &str) -> String {
    let path = path.strip_suffix('/').unwrap_or(path);
    path.to_ascii_lowercase()
}

/// The complete set of resolved routes, indexed for request matching.
///
/// Built once from a provider manifest and read-only afterwards, so it can
/// be shared across concurrent dispatch calls behind an `Arc` without locks.
///
/// # Examples
///
/// ```
/// use bitroute::router::{MethodMask, RouteDeclaration, RouteProvider, RouteTable};
/// use bitroute::reply::Reply;
/// use bitroute::http::Method;
///
/// struct MenuController;
///
/// impl RouteProvider for MenuController {
///     fn routes(&self) -> Vec<RouteDeclaration> {
///         vec![RouteDeclaration::new(
///             "/menus",
///             MethodMask::GET,
///             |_payload| Reply::text("ok"),
///         )]
///     }
/// }
///
/// let table = RouteTable::build(&[&MenuController]);
/// assert_eq!(table.len(), 1);
/// assert!(table.lookup(&Method::Get, "/menus/").is_some());
/// ```
#[derive(Default)]
pub struct RouteTable {
    entries: HashMap<(Method, String), RouteEntry>,
}

impl RouteTable {
    /// Creates an empty table. Every lookup misses until routes are inserted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from an explicit manifest of providers.
    ///
    /// Providers are visited in manifest order and declarations in the order
    /// each provider returns them; on a `(verb, path)` collision the entry
    /// registered last overwrites the earlier one.
    pub fn build(providers: &[&dyn RouteProvider]) -> Self {
        let mut table = Self::new();
        for provider in providers {
            for declaration in provider.routes() {
                table.insert(declaration);
            }
        }
        table
    }

    /// Expands one declaration into per-verb entries and inserts them.
    ///
    /// An N-bit mask yields N entries sharing the declaration's handler. A
    /// declaration without a path or with an empty mask is skipped silently.
    pub fn insert(&mut self, declaration: RouteDeclaration) {
        let Some(path) = declaration.path else {
            debug!("skipping route declaration without a path");
            return;
        };
        if declaration.methods.is_empty() {
            debug!(path = %path, "skipping route declaration with empty method mask");
            return;
        }

        for verb in declaration.methods.verbs() {
            let key = (verb.clone(), normalize_key(&path));
            let entry = RouteEntry {
                method: verb,
                path: path.clone(),
                handler: Arc::clone(&declaration.handler),
            };
            self.entries.insert(key, entry);
        }
    }

    /// Finds the entry matching `(method, path)`, if any.
    ///
    /// The probe path is normalized the same way declared paths were at
    /// insert time, so matching tolerates case differences and one trailing
    /// slash on either side.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&RouteEntry> {
        self.entries.get(&(method.clone(), normalize_key(path)))
    }

    /// Returns the number of resolved entries (one per verb, not per declaration).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop(_payload: Payload) -> Reply {
        Reply::text("ok")
    }

    // ── MethodMask ────────────────────────────────────────────────────────────

    #[test]
    fn mask_bit_values_are_stable() {
        assert_eq!(MethodMask::GET.bits(), 1);
        assert_eq!(MethodMask::POST.bits(), 2);
        assert_eq!(MethodMask::PUT.bits(), 4);
        assert_eq!(MethodMask::PATCH.bits(), 8);
        assert_eq!(MethodMask::DELETE.bits(), 16);
    }

    #[test]
    fn mask_bitor_composes() {
        let mask = MethodMask::PUT | MethodMask::PATCH;
        assert_eq!(mask.bits(), 12);
        assert!(mask.contains(MethodMask::PUT));
        assert!(mask.contains(MethodMask::PATCH));
        assert!(!mask.contains(MethodMask::DELETE));
    }

    #[test]
    fn mask_from_bits_drops_unknown_bits() {
        assert_eq!(MethodMask::from_bits(12), MethodMask::PUT | MethodMask::PATCH);
        assert_eq!(MethodMask::from_bits(0b100000), MethodMask::NONE);
        assert_eq!(MethodMask::from_bits(0b100001), MethodMask::GET);
    }

    #[test]
    fn mask_verbs_in_bit_order() {
        let all = MethodMask::from_bits(0b11111);
        let verbs: Vec<Method> = all.verbs().collect();
        assert_eq!(
            verbs,
            vec![
                Method::Get,
                Method::Post,
                Method::Put,
                Method::Patch,
                Method::Delete
            ]
        );
    }

    #[test]
    fn mask_display() {
        assert_eq!((MethodMask::PUT | MethodMask::PATCH).to_string(), "PUT|PATCH");
        assert_eq!(MethodMask::NONE.to_string(), "");
    }

    // ── RouteTable expansion ──────────────────────────────────────────────────

    #[test]
    fn multi_verb_declaration_expands_per_bit() {
        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::new(
            "/menus/update",
            MethodMask::PUT | MethodMask::PATCH,
            noop,
        ));

        assert_eq!(table.len(), 2);
        let put = table.lookup(&Method::Put, "/menus/update").unwrap();
        let patch = table.lookup(&Method::Patch, "/menus/update").unwrap();
        assert_eq!(put.method(), &Method::Put);
        assert_eq!(patch.method(), &Method::Patch);
        // Both entries share one handler.
        assert!(Arc::ptr_eq(put.handler(), patch.handler()));
    }

    #[test]
    fn entry_keeps_declared_path_verbatim() {
        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::new("/Menus", MethodMask::GET, noop));
        let entry = table.lookup(&Method::Get, "/menus").unwrap();
        assert_eq!(entry.path(), "/Menus");
    }

    #[test]
    fn empty_mask_declaration_is_inert() {
        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::new("/menus", MethodMask::NONE, noop));
        assert!(table.is_empty());
    }

    #[test]
    fn unknown_bits_only_declaration_is_inert() {
        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::new(
            "/menus",
            MethodMask::from_bits(0b1100000),
            noop,
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn pathless_declaration_is_inert() {
        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::unbound(MethodMask::GET, noop));
        assert!(table.is_empty());
    }

    #[test]
    fn collision_last_registered_wins() {
        static SECOND_CALLED: AtomicUsize = AtomicUsize::new(0);

        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::new("/menus", MethodMask::GET, |_p| {
            Reply::text("first")
        }));
        table.insert(RouteDeclaration::new("/menus", MethodMask::GET, |_p| {
            SECOND_CALLED.fetch_add(1, Ordering::SeqCst);
            Reply::text("second")
        }));

        assert_eq!(table.len(), 1);
        let entry = table.lookup(&Method::Get, "/menus").unwrap();
        (entry.handler())(Payload::new());
        assert_eq!(SECOND_CALLED.load(Ordering::SeqCst), 1);
    }

    // ── Lookup normalization ──────────────────────────────────────────────────

    #[test]
    fn lookup_strips_one_trailing_slash() {
        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::new("/menus", MethodMask::GET, noop));
        assert!(table.lookup(&Method::Get, "/menus").is_some());
        assert!(table.lookup(&Method::Get, "/menus/").is_some());
        // Only one slash is stripped.
        assert!(table.lookup(&Method::Get, "/menus//").is_none());
    }

    #[test]
    fn lookup_is_path_case_insensitive() {
        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::new("/Menus/Update", MethodMask::GET, noop));
        assert!(table.lookup(&Method::Get, "/menus/update").is_some());
        assert!(table.lookup(&Method::Get, "/MENUS/UPDATE/").is_some());
    }

    #[test]
    fn root_path_matches_itself() {
        // "/" normalizes to "" on both sides, so the boundary still matches.
        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::new("/", MethodMask::GET, noop));
        assert!(table.lookup(&Method::Get, "/").is_some());
    }

    #[test]
    fn lookup_misses_on_wrong_verb() {
        let mut table = RouteTable::new();
        table.insert(RouteDeclaration::new("/menus", MethodMask::GET, noop));
        assert!(table.lookup(&Method::Post, "/menus").is_none());
        assert!(
            table
                .lookup(&Method::Custom("BREW".into()), "/menus")
                .is_none()
        );
    }

    // ── Provider manifest ─────────────────────────────────────────────────────

    struct TwoRouteController;

    impl RouteProvider for TwoRouteController {
        fn routes(&self) -> Vec<RouteDeclaration> {
            vec![
                RouteDeclaration::new("/menus", MethodMask::GET, noop),
                RouteDeclaration::new(
                    "/menus/update",
                    MethodMask::PUT | MethodMask::PATCH,
                    noop,
                ),
            ]
        }
    }

    #[test]
    fn build_expands_provider_manifest() {
        let table = RouteTable::build(&[&TwoRouteController]);
        assert_eq!(table.len(), 3);
        assert!(table.lookup(&Method::Get, "/menus").is_some());
        assert!(table.lookup(&Method::Put, "/menus/update").is_some());
        assert!(table.lookup(&Method::Patch, "/menus/update").is_some());
    }

    #[test]
    fn build_is_idempotent() {
        let first = RouteTable::build(&[&TwoRouteController]);
        let second = RouteTable::build(&[&TwoRouteController]);
        assert_eq!(first.len(), second.len());
    }
}
