//! The producer's client fan-out list (spec §4.5, Design Note "Fan-out client list").
//!
//! Grounded on `stream7k.c`'s client table: clients are appended by the listener thread and
//! iterated by the producer thread under one mutex, rather than per-client locks. A client whose
//! channel send fails (its writer thread has already exited after a socket error) is dropped on
//! the next dispatch pass instead of being actively watched for.
use std::collections::HashSet;
use std::sync::mpsc::Sender;
use std::sync::Mutex;

/// One connected subscriber: the half of a channel its writer thread drains, and the set of 7K
/// `record_type_id`s it asked to receive. `None` means "everything" (no subscribe request has
/// narrowed it yet).
pub struct ClientHandle {
    id: u64,
    sender: Sender<Vec<u8>>,
    subscribed: Option<HashSet<u32>>,
}

impl ClientHandle {
    pub fn new(id: u64, sender: Sender<Vec<u8>>) -> Self {
        ClientHandle { id, sender, subscribed: None }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn set_subscription(&mut self, ids: HashSet<u32>) {
        self.subscribed = Some(ids);
    }

    fn wants(&self, record_type_id: u32) -> bool {
        match &self.subscribed {
            Some(ids) => ids.contains(&record_type_id),
            None => true,
        }
    }
}

/// Mutex-guarded fan-out list, shared between the listener and producer threads.
#[derive(Default)]
pub struct FanoutList {
    clients: Mutex<Vec<ClientHandle>>,
}

impl FanoutList {
    pub fn new() -> Self {
        FanoutList { clients: Mutex::new(Vec::new()) }
    }

    pub fn add(&self, client: ClientHandle) {
        self.clients.lock().unwrap().push(client);
    }

    pub fn len(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    pub fn set_subscription(&self, client_id: u64, ids: HashSet<u32>) {
        let mut clients = self.clients.lock().unwrap();
        if let Some(c) = clients.iter_mut().find(|c| c.id() == client_id) {
            c.set_subscription(ids);
        }
    }

    /// Sends `frame` to every client subscribed to `record_type_id`, dropping any client whose
    /// send fails (mark-and-sweep, one pass per dispatch).
    pub fn dispatch(&self, record_type_id: u32, frame: &[u8]) {
        let mut clients = self.clients.lock().unwrap();
        clients.retain(|c| {
            if !c.wants(record_type_id) {
                return true;
            }
            c.sender.send(frame.to_vec()).is_ok()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn dispatch_skips_clients_not_subscribed_to_the_record_type() {
        let list = FanoutList::new();
        let (tx, rx) = channel();
        let mut handle = ClientHandle::new(1, tx);
        handle.set_subscription([7027u32].iter().copied().collect());
        list.add(handle);

        list.dispatch(1012, b"attitude");
        assert!(rx.try_recv().is_err());

        list.dispatch(7027, b"ping");
        assert_eq!(rx.try_recv().unwrap(), b"ping");
    }

    #[test]
    fn dispatch_drops_a_client_whose_receiver_has_been_dropped() {
        let list = FanoutList::new();
        let (tx, rx) = channel();
        list.add(ClientHandle::new(1, tx));
        drop(rx);

        list.dispatch(7027, b"ping");
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn unsubscribed_client_receives_every_record_type() {
        let list = FanoutList::new();
        let (tx, rx) = channel();
        list.add(ClientHandle::new(1, tx));

        list.dispatch(7027, b"ping");
        list.dispatch(1012, b"attitude");
        assert_eq!(rx.try_recv().unwrap(), b"ping");
        assert_eq!(rx.try_recv().unwrap(), b"attitude");
    }
}
