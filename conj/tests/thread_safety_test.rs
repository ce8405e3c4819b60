use conj::{Delay, Dereference, Map, Namespace, Seq, Value, Vector, keyword, map, symbol, vector};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_collections_are_send_sync() {
    assert_send_sync::<Value>();
    assert_send_sync::<Vector<Value>>();
    assert_send_sync::<Map<Value, Value>>();
    assert_send_sync::<Seq<Value>>();
    assert_send_sync::<Namespace>();
    assert_send_sync::<Delay<Value>>();
}

#[test]
fn test_shared_vector_read_from_many_threads() {
    let shared: Vector<i64> = (0..10_000).collect();

    let mut handles = vec![];
    for t in 0..8 {
        let v = shared.clone();
        handles.push(thread::spawn(move || {
            // Each thread derives its own version from the shared one
            let mine = v.assoc(t, -1).unwrap().cons(t);
            (v.iter().sum::<i64>(), mine.len())
        }));
    }

    for handle in handles {
        let (sum, len) = handle.join().unwrap();
        assert_eq!(sum, (0..10_000).sum::<i64>());
        assert_eq!(len, 10_001);
    }

    // The original is untouched by any thread's updates
    assert_eq!(shared.entry(0), Some(&0));
    assert_eq!(shared.len(), 10_000);
}

#[test]
fn test_shared_map_updates_are_isolated() {
    let base = map((0..1_000i64).map(|i| (Value::Int(i), Value::Int(i))));

    let handles: Vec<_> = (0..4i64)
        .map(|t| {
            let m = base.clone();
            thread::spawn(move || {
                let k = Value::from(keyword("thread"));
                let m = m.assoc(k.clone(), Value::Int(t)).dissoc(&Value::Int(t));
                (m.get(&k).cloned(), m.len())
            })
        })
        .collect();

    for (t, handle) in handles.into_iter().enumerate() {
        let (tag, len) = handle.join().unwrap();
        assert_eq!(tag, Some(Value::Int(t as i64)));
        assert_eq!(len, 1_000);
    }
    assert_eq!(base.len(), 1_000);
}

#[test]
fn test_lazy_seq_realized_once_across_threads() {
    let pulled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&pulled);
    let s = Seq::lazy((0..100i64).map(move |n| {
        counter.fetch_add(1, Ordering::SeqCst);
        n
    }));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let s = s.clone();
            thread::spawn(move || s.iter().copied().collect::<Vec<i64>>())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (0..100).collect::<Vec<i64>>());
    }
    assert_eq!(pulled.load(Ordering::SeqCst), 100);
}

#[test]
fn test_namespace_concurrent_interns() {
    let ns = Namespace::new(symbol("user"));

    let handles: Vec<_> = (0..8i64)
        .map(|t| {
            let ns = ns.clone();
            thread::spawn(move || {
                for i in 0..50 {
                    ns.intern(symbol(&format!("v{t}-{i}")), Value::Int(i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(ns.mappings().len(), 400);
    assert_eq!(ns.find(&symbol("v3-7")), Some(Value::Int(7)));
}

#[test]
fn test_delay_forced_once_across_threads() {
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let d = Delay::new(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Value::Vector(vector([Value::Int(1)]))
    });

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let d = d.clone();
            thread::spawn(move || d.deref().clone())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), Value::Vector(vector([Value::Int(1)])));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(d.is_realized());
}
