use std::ops::{Deref, DerefMut};

pub(crate) trait NullCheck {
    fn is_null(&self) -> bool;
}

impl<T> NullCheck for *const T {
    fn is_null(&self) -> bool {
        (*self as *const T).is_null()
    }
}

impl<T> NullCheck for *mut T {
    fn is_null(&self) -> bool {
        (*self as *const T).is_null()
    }
}

/// Owner of a SQLite handle, released by `dealloc` unless null.
#[derive(Debug)]
pub(crate) struct CBox<T: NullCheck> {
    pub(crate) ptr: T,
    dealloc: fn(T),
}

impl<T: NullCheck> CBox<T> {
    pub fn new(ptr: T, dealloc: fn(T)) -> Self {
        Self { ptr, dealloc }
    }
}

impl<T: NullCheck> Drop for CBox<T> {
    fn drop(&mut self) {
        if !self.is_null() {
            unsafe {
                (self.dealloc)(std::ptr::read(&self.ptr as *const T));
            }
        }
    }
}

impl<T: NullCheck> Deref for CBox<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.ptr
    }
}

impl<T: NullCheck> DerefMut for CBox<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.ptr
    }
}

unsafe impl<T: NullCheck> Send for CBox<T> {}
unsafe impl<T: NullCheck> Sync for CBox<T> {}

#[cfg(test)]
mod tests {
    use crate::cbox::CBox;
    use std::{
        ptr,
        sync::atomic::{AtomicBool, Ordering},
    };

    static RELEASED: AtomicBool = AtomicBool::new(false);

    #[test]
    fn releases_only_non_null_handles() {
        let v = 123;
        let handle: *const i32 = &v;
        {
            let handle = CBox::new(ptr::null::<i32>(), |_| RELEASED.store(true, Ordering::SeqCst));
            assert!(handle.is_null());
        }
        assert!(!RELEASED.load(Ordering::SeqCst));
        {
            let handle = CBox::new(handle, |_| RELEASED.store(true, Ordering::SeqCst));
            assert_eq!(unsafe { **handle }, 123);
            assert!(!RELEASED.load(Ordering::SeqCst));
        }
        assert!(RELEASED.load(Ordering::SeqCst));
    }
}
