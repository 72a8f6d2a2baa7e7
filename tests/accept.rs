//! Lowers the process's descriptor limit, so it lives in its own test binary.
#![cfg(unix)]

use quizserv::game::User;
use quizserv::network::wire::{self, Command};
use quizserv::{Game, Network};
use std::fs::File;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::os::unix::io::AsRawFd;
use std::thread;
use std::time::Duration;

fn lower_fd_limit(limit: libc::rlim_t) {
    let mut rlim = libc::rlimit { rlim_cur: 0, rlim_max: 0 };
    assert_eq!(unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) }, 0);
    rlim.rlim_cur = limit.min(rlim.rlim_max);
    assert_eq!(unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &rlim) }, 0);
}

#[test]
fn accepting_resumes_after_running_out_of_descriptors() {
    let alice = User {
        username: "alice".into(),
        password: "secret".into(),
        score: 0,
        questions_asked: vec![],
    };
    let mut game = Game::new(vec![alice], vec![]).unwrap();
    let mut network = Network::bind("127.0.0.1:0").unwrap();
    let addr = network.local_addr().unwrap();
    let server = thread::spawn(move || network.run(&mut game));

    let lowest_free = File::open("/dev/null").unwrap().as_raw_fd();
    lower_fd_limit(lowest_free as libc::rlim_t + 32);

    // use up every descriptor, then free one for the client's end
    let mut hoard = Vec::new();
    loop {
        match File::open("/dev/null") {
            Ok(file) => hoard.push(file),
            Err(e) => {
                assert_eq!(e.raw_os_error(), Some(libc::EMFILE), "{e}");
                break;
            }
        }
    }
    hoard.pop();
    let mut conn = TcpStream::connect(addr).unwrap();

    // the server can't take its end of the connection yet
    thread::sleep(Duration::from_millis(300));
    assert!(!server.is_finished(), "server stopped: {:?}", server.join());
    drop(hoard);

    conn.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    conn.write_all(&wire::encode(Command::Login.token(), "alice#secret").unwrap()).unwrap();
    let mut buf = vec![0; wire::MAX_MSG_LENGTH];
    let n = conn.read(&mut buf).unwrap();
    assert_eq!(wire::decode(&buf[..n]).unwrap().command, Command::LoginOk);
}
