use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use slate_vfs::{Vfs, VfsEvent};

#[test]
fn subscriber_can_mutate_during_dispatch() {
    let vfs = Vfs::empty();
    let mirror = vfs.clone();
    vfs.watch(move |event| {
        if let VfsEvent::FileCreated { file } = event {
            if file.path().extension() == "md" {
                mirror.create_file(format!("{}.bak", file.path()), file.content());
            }
        }
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    vfs.watch(move |event| {
        sink.lock()
            .unwrap()
            .push(event.path().map(ToString::to_string).unwrap_or_default());
    });

    vfs.create_file("/notes.md", "text");

    assert_eq!(vfs.read_file("/notes.md.bak").unwrap().content(), "text");
    // Every subscriber sees the original event before the nested one.
    assert_eq!(*seen.lock().unwrap(), vec!["/notes.md", "/notes.md.bak"]);
}

#[test]
fn subscriber_can_unwatch_itself() {
    let vfs = Vfs::empty();
    let calls = Arc::new(AtomicUsize::new(0));
    let own_id = Arc::new(Mutex::new(None));

    let handle = vfs.clone();
    let counter = calls.clone();
    let id_slot = own_id.clone();
    let subscription = vfs.watch(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        if let Some(id) = *id_slot.lock().unwrap() {
            handle.unwatch(id);
        }
    });
    *own_id.lock().unwrap() = Some(subscription.id());

    vfs.create_file("/a", "");
    vfs.create_file("/b", "");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn panicking_subscriber_does_not_abort_mutation() {
    let vfs = Vfs::empty();
    vfs.watch(|_| panic!("subscriber failure"));
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    vfs.watch(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let file = vfs.create_file("/a.txt", "ok");
    assert_eq!(file.content(), "ok");
    assert!(vfs.file_exists("/a.txt"));
    assert!(vfs.delete_file("/a.txt"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn clones_share_state_across_threads() {
    let vfs = Vfs::empty();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let vfs = vfs.clone();
            std::thread::spawn(move || {
                vfs.create_file(format!("/t{i}.txt"), i.to_string());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(vfs.file_count(), 4);
}

#[test]
fn mutation_on_another_thread_waits_for_delivery() {
    let vfs = Vfs::empty();
    let (started_tx, started_rx) = std::sync::mpsc::channel();
    let started_tx = Mutex::new(started_tx);
    vfs.watch(move |event| {
        if event.path().map(|p| p.as_str()) == Some("/slow.txt") {
            started_tx.lock().unwrap().send(()).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(200));
        }
    });
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    vfs.watch(move |event| {
        sink.lock()
            .unwrap()
            .push(event.path().map(ToString::to_string).unwrap_or_default());
    });

    let slow = {
        let vfs = vfs.clone();
        std::thread::spawn(move || {
            vfs.create_file("/slow.txt", "");
        })
    };
    started_rx.recv().unwrap();

    let fast = {
        let vfs = vfs.clone();
        let seen = seen.clone();
        std::thread::spawn(move || {
            vfs.create_file("/fast.txt", "");
            seen.lock().unwrap().clone()
        })
    };
    let seen_when_fast_returned = fast.join().unwrap();
    slow.join().unwrap();

    assert_eq!(seen_when_fast_returned, vec!["/slow.txt", "/fast.txt"]);
}
