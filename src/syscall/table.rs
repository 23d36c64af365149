//! Built-in syscall table
//!
//! Argument layouts of the syscalls the tracer understands, keyed by the
//! arm64 syscall numbers the collector reports.

use crate::syscall::point::{PointArg, PointArgs, WatchPoint};
use crate::syscall::registry::WatchPointRegistry;
use crate::syscall::types::{
	ArgType, INT, NONE, POINTER, SIGACTION, SOCKADDR, STAT, STATFS, STRING, STRING_ARR, TIMESPEC, UINT, UINT32,
	UINT64, UTSNAME,
};

fn a(name: &'static str, arg_type: &'static ArgType) -> PointArg {
	PointArg::enter(name, arg_type)
}

fn b(name: &'static str, arg_type: &'static ArgType) -> PointArg {
	PointArg::exit(name, arg_type)
}

fn sys(nr: u32, name: &'static str, args: Vec<PointArg>) -> WatchPoint {
	WatchPoint::syscall(nr, PointArgs::new(name, args))
}

fn noreturn(nr: u32, name: &'static str, args: Vec<PointArg>) -> WatchPoint {
	WatchPoint::syscall(nr, PointArgs::with_ret(name, b("ret", &NONE), args))
}

/// Every built-in syscall watch-point
#[must_use]
pub fn builtin_points() -> Vec<WatchPoint> {
	vec![
		sys(0, "io_setup", vec![a("nr_events", &UINT), a("ctx_idp", &POINTER)]),
		sys(8, "getxattr", vec![a("path", &STRING), a("name", &STRING), a("value", &POINTER), a("size", &INT)]),
		sys(9, "lgetxattr", vec![a("path", &STRING), a("name", &STRING), a("value", &POINTER), a("size", &INT)]),
		sys(10, "fgetxattr", vec![a("fd", &INT), a("name", &STRING), a("value", &POINTER), a("size", &INT)]),
		sys(17, "getcwd", vec![b("buf", &STRING), a("size", &UINT64)]),
		sys(23, "dup", vec![a("oldfd", &INT)]),
		sys(24, "dup3", vec![a("oldfd", &INT), a("newfd", &UINT64), a("flags", &INT)]),
		sys(
			29,
			"ioctl",
			vec![
				a("fd", &INT),
				a("request", &UINT64),
				a("arg0", &INT),
				a("arg1", &INT),
				a("arg2", &INT),
				a("arg3", &INT),
			],
		),
		sys(34, "mkdirat", vec![a("dirfd", &INT), a("pathname", &STRING), a("mode", &INT)]),
		sys(35, "unlinkat", vec![a("dirfd", &INT), a("pathname", &STRING), a("flags", &INT)]),
		sys(36, "symlinkat", vec![a("target", &STRING), a("newdirfd", &INT), a("linkpath", &STRING)]),
		sys(
			37,
			"linkat",
			vec![
				a("olddirfd", &INT),
				a("oldpath", &STRING),
				a("newdirfd", &INT),
				a("newpath", &STRING),
				a("flags", &INT),
			],
		),
		sys(
			38,
			"renameat",
			vec![a("olddirfd", &INT), a("oldpath", &STRING), a("newdirfd", &INT), a("newpath", &STRING)],
		),
		sys(39, "umount2", vec![a("target", &STRING), a("flags", &INT)]),
		sys(
			40,
			"mount",
			vec![
				a("source", &INT),
				a("target", &STRING),
				a("filesystemtype", &STRING),
				a("mountflags", &INT),
				a("data", &POINTER),
			],
		),
		sys(43, "statfs", vec![a("path", &STRING), b("buf", &STATFS)]),
		sys(44, "fstatfs", vec![a("fd", &INT), b("buf", &STATFS)]),
		sys(45, "truncate", vec![a("path", &STRING), a("length", &INT)]),
		sys(46, "ftruncate", vec![a("fd", &INT), a("length", &INT)]),
		sys(47, "fallocate", vec![a("fd", &INT), a("mode", &INT), a("offset", &INT), a("len", &INT)]),
		sys(48, "faccessat", vec![a("dirfd", &INT), a("pathname", &STRING), a("flags", &INT), a("mode", &UINT32)]),
		sys(49, "chdir", vec![a("path", &STRING)]),
		sys(50, "fchdir", vec![a("fd", &INT)]),
		sys(51, "chroot", vec![a("path", &STRING)]),
		sys(56, "openat", vec![a("dirfd", &INT), a("pathname", &STRING), a("flags", &INT), a("mode", &UINT32)]),
		sys(59, "pipe2", vec![b("pipefd", &POINTER), a("flags", &INT)]),
		sys(78, "readlinkat", vec![a("dirfd", &INT), a("pathname", &STRING), b("buf", &STRING), a("bufsiz", &INT)]),
		sys(79, "newfstatat", vec![a("dirfd", &INT), a("pathname", &STRING), b("statbuf", &STAT), a("flags", &INT)]),
		sys(80, "fstat", vec![a("fd", &INT), b("statbuf", &STAT)]),
		noreturn(93, "exit", vec![a("status", &INT)]),
		noreturn(94, "exit_group", vec![a("status", &INT)]),
		sys(101, "nanosleep", vec![a("req", &TIMESPEC), a("rem", &TIMESPEC)]),
		sys(117, "ptrace", vec![a("request", &INT), a("pid", &INT), a("addr", &POINTER), a("data", &POINTER)]),
		sys(129, "kill", vec![a("pid", &INT), a("sig", &INT)]),
		sys(130, "tkill", vec![a("tid", &INT), a("sig", &INT)]),
		sys(131, "tgkill", vec![a("tgid", &INT), a("tid", &INT), a("sig", &INT)]),
		sys(134, "rt_sigaction", vec![a("signum", &INT), a("act", &SIGACTION), a("oldact", &SIGACTION)]),
		sys(
			135,
			"rt_sigprocmask",
			vec![a("how", &INT), a("set", &UINT64), a("oldset", &UINT64), a("sigsetsize", &INT)],
		),
		sys(160, "uname", vec![b("buf", &UTSNAME)]),
		sys(166, "umask", vec![a("mode", &INT)]),
		sys(
			167,
			"prctl",
			vec![a("option", &INT), a("arg2", &UINT64), a("arg3", &UINT64), a("arg4", &UINT64), a("arg5", &UINT64)],
		),
		sys(203, "connect", vec![a("sockfd", &INT), a("addr", &SOCKADDR), a("addrlen", &UINT32)]),
		sys(
			220,
			"clone",
			vec![
				a("fn", &POINTER),
				a("stack", &POINTER),
				a("flags", &INT),
				a("arg0", &INT),
				a("arg1", &INT),
				a("arg2", &INT),
			],
		),
		sys(221, "execve", vec![a("pathname", &STRING), a("argv", &STRING_ARR), a("envp", &STRING_ARR)]),
		sys(
			276,
			"renameat2",
			vec![
				a("olddirfd", &INT),
				a("oldpath", &STRING),
				a("newdirfd", &INT),
				a("newpath", &STRING),
				a("flags", &INT),
			],
		),
		sys(277, "seccomp", vec![a("operation", &INT), a("flags", &INT), a("args", &POINTER)]),
		sys(279, "memfd_create", vec![a("name", &STRING), a("flags", &INT)]),
		sys(280, "bpf", vec![a("cmd", &INT), a("attr", &POINTER), a("size", &INT)]),
		sys(
			281,
			"execveat",
			vec![
				a("dirfd", &INT),
				a("pathname", &STRING),
				a("argv", &STRING_ARR),
				a("envp", &STRING_ARR),
				a("flags", &INT),
			],
		),
		sys(439, "faccessat2", vec![a("dirfd", &INT), a("pathname", &STRING), a("flags", &INT), a("mode", &UINT32)]),
	]
}

/// Populate `registry` with the built-in table
///
/// # Panics
///
/// Panics if the table conflicts with points already in `registry`.
pub fn register_builtin(registry: &mut WatchPointRegistry) {
	for point in builtin_points() {
		registry.register(point);
	}
}
