/// The fact categories understood by the engine.
///
/// Each key is process-wide unique and never reused across categories; a
/// fact is stored under exactly one `(Target, MetadataKey, member)` tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKey {
    /// Controller descriptor: the url prefix of an api class.
    Api,
    /// Per-member list of HTTP method descriptors.
    ApiMethod,
    /// Per-member middleware list.
    ApiMethodMiddleware,
    /// Per-member parameter binding list.
    ApiMethodParams,
    /// Per-member validation schema.
    ApiMethodValidation,
    /// Ordered list of declared member names on an api class.
    ApiMembers,
    /// Route-group descriptor: the ordered controller list.
    Route,
    /// Route-group level middleware list.
    RouteMiddleware,
    /// The injector identity token of an injectable class.
    InjectableId,
    /// Constructor parameter types, in declaration order.
    ParamTypes,
}
