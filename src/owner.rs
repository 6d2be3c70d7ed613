use std::ffi::CStr;

use libc::{c_char, getgrgid_r, getpwuid_r, group, passwd};

/// Resolve a numeric user ID to its symbolic name, if the system knows one.
pub fn user_name(uid: u32) -> Option<String> {
    let mut pwd: passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut passwd = std::ptr::null_mut();
    let mut buf = vec![0 as c_char; 1024];
    loop {
        let rc = unsafe { getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };
        if rc == libc::ERANGE {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(pwd.pw_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}

/// Resolve a numeric group ID to its symbolic name, if the system knows one.
pub fn group_name(gid: u32) -> Option<String> {
    let mut grp: group = unsafe { std::mem::zeroed() };
    let mut result: *mut group = std::ptr::null_mut();
    let mut buf = vec![0 as c_char; 1024];
    loop {
        let rc = unsafe { getgrgid_r(gid, &mut grp, buf.as_mut_ptr(), buf.len(), &mut result) };
        if rc == libc::ERANGE {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() {
            return None;
        }
        let name = unsafe { CStr::from_ptr(grp.gr_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}
