//! Pre-order flattening of record forests.

/// Flatten a forest in pre-order: each node, then its children's subtrees.
///
/// ```rust
/// use sift_query::traverse::select_more;
///
/// #[derive(Clone)]
/// struct Dir {
///     name: &'static str,
///     children: Vec<Dir>,
/// }
///
/// let root = Dir {
///     name: "/",
///     children: vec![Dir { name: "etc", children: vec![] }],
/// };
/// let names: Vec<_> = select_more(&[root], |d| d.children.as_slice()).iter().map(|d| d.name).collect();
/// assert_eq!(names, ["/", "etc"]);
/// ```
pub fn select_more<'a, T, F>(roots: &'a [T], children: F) -> Vec<T>
where
    T: Clone,
    F: FnMut(&'a T) -> &'a [T],
{
    select_more_where(roots, children, |_| true)
}

/// Like [`select_more`], but a node failing `predicate` is omitted along
/// with its whole subtree.
pub fn select_more_where<'a, T, F, P>(roots: &'a [T], mut children: F, mut predicate: P) -> Vec<T>
where
    T: Clone,
    F: FnMut(&'a T) -> &'a [T],
    P: FnMut(&T) -> bool,
{
    let mut out = Vec::new();
    // Explicit stack, children pushed in reverse to keep pre-order.
    let mut stack: Vec<&'a T> = roots.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if !predicate(node) {
            continue;
        }
        out.push(node.clone());
        stack.extend(children(node).iter().rev());
    }
    out
}
