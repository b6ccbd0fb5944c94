#![allow(unused_macros)]

/// Helper macro for locking items
///
/// ```rust, ignore
///  let mut pending = lock!(self.pending);
///  *pending = Some(callback);
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().expect("Failed to acquire lock")
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let fields = read_lock!(object.fields);
///  println!("{}", fields.len());
/// ```
macro_rules! read_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock.read().expect("Failed to acquire read lock")
    };
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  let mut fields = write_lock!(object.fields);
///  fields.insert("m_value".to_string(), Value::I32(42));
/// ```
macro_rules! write_lock {
    ($arc_rwlock:expr) => {
        $arc_rwlock.write().expect("Failed to acquire write lock")
    };
}
