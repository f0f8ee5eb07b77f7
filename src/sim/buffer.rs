//! 无锁事件缓冲区
//!
//! 多生产者 / 单消费者：任意线程都可以并发 `insert`，且插入永不阻塞；
//! 消费者通过 `drain` 原子地摘下整条链表。
//!
//! 实现为一条单向链表：头指针是 `AtomicPtr`，插入通过 CAS 重试把新节点
//! 挂到链表头部；`drain` 用 `swap(null)` 一次性取走整条链，因此不存在
//! 单个节点的弹出操作，也就没有 ABA 问题。

use std::marker::PhantomData;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

struct Link<T> {
    next: *mut Link<T>,
    item: T,
}

/// 并发插入、原子取空的缓冲区。
///
/// `drain` 返回的顺序与插入顺序相反，调用方必须把它当作无序集合。
pub struct EventBuffer<T> {
    head: AtomicPtr<Link<T>>,
    _owns: PhantomData<*const T>,
}

// SAFETY: 链表节点只通过 CAS 发布、只通过 swap 整体摘下，`T` 的所有权随节点
// 在线程间转移一次，因此只要求 `T: Send`。
unsafe impl<T: Send> Send for EventBuffer<T> {}
unsafe impl<T: Send> Sync for EventBuffer<T> {}

impl<T> Default for EventBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventBuffer<T> {
    pub fn new() -> Self {
        Self {
            head: AtomicPtr::new(ptr::null_mut()),
            _owns: PhantomData,
        }
    }

    /// 插入一个元素；无锁，永不失败。
    pub fn insert(&self, item: T) {
        let link = Box::into_raw(Box::new(Link {
            next: ptr::null_mut(),
            item,
        }));
        let mut head = self.head.load(Ordering::Relaxed);
        loop {
            // SAFETY: `link` 尚未发布，当前线程独占。
            unsafe { (*link).next = head };
            match self
                .head
                .compare_exchange_weak(head, link, Ordering::Release, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(actual) => head = actual,
            }
        }
    }

    pub fn insert_all(&self, items: impl IntoIterator<Item = T>) {
        for item in items {
            self.insert(item);
        }
    }

    /// 摘下自上次 `drain` 以来插入的全部元素。
    pub fn drain(&self) -> Vec<T> {
        let mut cur = self.head.swap(ptr::null_mut(), Ordering::Acquire);
        let mut out = Vec::new();
        while !cur.is_null() {
            // SAFETY: swap 之后整条链只属于当前线程，每个节点都来自 `Box::into_raw`。
            let link = unsafe { Box::from_raw(cur) };
            cur = link.next;
            out.push(link.item);
        }
        out
    }

    /// 瞬时快照；并发插入时结果可能立刻过期。
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire).is_null()
    }
}

impl<T> Drop for EventBuffer<T> {
    fn drop(&mut self) {
        drop(self.drain());
    }
}
