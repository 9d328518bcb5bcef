use super::*;

#[test]
fn test_intern_deduplicates() {
    let interner = ShardedInterner::new();
    let a = interner.intern("kotlin.collections.List");
    let b = interner.intern("kotlin.collections.List");
    let c = interner.intern("kotlin.collections.MutableList");

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(&*interner.resolve(a), "kotlin.collections.List");
}

#[test]
fn test_empty_string_is_none_atom() {
    let interner = ShardedInterner::new();
    assert_eq!(interner.intern(""), Atom::NONE);
    assert!(interner.intern("").is_none());
    assert_eq!(&*interner.resolve(Atom::NONE), "");
    assert!(interner.is_empty());
}

#[test]
fn test_get_does_not_insert() {
    let interner = ShardedInterner::new();
    assert_eq!(interner.get("foo.Bar"), None);
    let atom = interner.intern("foo.Bar");
    assert_eq!(interner.get("foo.Bar"), Some(atom));
    assert_eq!(interner.len(), 2);
}

#[test]
fn test_intern_common_is_idempotent() {
    let interner = ShardedInterner::new();
    interner.intern_common();
    let len = interner.len();
    interner.intern_common();
    assert_eq!(interner.len(), len);
    assert!(interner.get("java.util.List").is_some());
}

#[test]
fn test_concurrent_intern_agrees() {
    let interner = std::sync::Arc::new(ShardedInterner::new());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let interner = std::sync::Arc::clone(&interner);
            std::thread::spawn(move || {
                (0..64)
                    .map(|i| interner.intern(&format!("pkg.C{i}")))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let results: Vec<Vec<Atom>> = handles
        .into_iter()
        .map(|h| h.join().expect("interner thread panicked"))
        .collect();
    for other in &results[1..] {
        assert_eq!(&results[0], other);
    }
}
