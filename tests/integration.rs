use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use scoped_fm::config::ServerConfig;
use scoped_fm::error::StorageError;
use scoped_fm::storage::{EntryKind, Upload};
use scoped_fm::{FileManager, Sandbox, Server};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

// Helper to build an engine over a fresh storage root
fn setup_manager() -> (TempDir, FileManager, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    let manager = FileManager::new(Sandbox::new(&root).unwrap());
    (temp, manager, root)
}

#[test]
fn test_traversal_never_escapes_root() {
    let (_temp, fm, root) = setup_manager();
    for path in ["../outside-secret.txt", "a/../../x", "..\\..\\x", "./../x", "a/b/.."] {
        assert!(matches!(fm.delete_file(path), Err(StorageError::InvalidPath(_))));
        assert!(matches!(fm.create_file(path, "x"), Err(StorageError::InvalidPath(_))));
        assert!(matches!(fm.list(path), Err(StorageError::InvalidPath(_))));
        assert!(matches!(fm.copy_file("a.txt", path), Err(StorageError::InvalidPath(_))));
    }
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);
}

#[test]
fn test_absolute_looking_paths_land_inside_root() {
    let (_temp, fm, root) = setup_manager();
    fm.create_file("/etc/passwd", "not really").unwrap();
    assert!(root.join("etc").join("passwd").is_file());
}

#[test]
fn test_create_folder_then_file_then_list() {
    let (_temp, fm, _root) = setup_manager();
    fm.create_folder("a/b/c").unwrap();
    assert!(matches!(fm.create_folder("a/b/c"), Err(StorageError::AlreadyExists(_))));
    fm.create_file("a/b/readme.md", "# hi").unwrap();

    let listing = fm.list("a/b").unwrap();
    let crumbs: Vec<(&str, &str)> = listing
        .breadcrumb
        .iter()
        .map(|c| (c.name.as_str(), c.path.as_str()))
        .collect();
    assert_eq!(crumbs, [("root", ""), ("a", "a"), ("b", "a/b")]);

    let rows: Vec<(&str, EntryKind, Option<u64>)> = listing
        .entries
        .iter()
        .map(|e| (e.relative_path.as_str(), e.kind, e.size))
        .collect();
    assert_eq!(
        rows,
        [
            ("a/b/c", EntryKind::Folder, None),
            ("a/b/readme.md", EntryKind::File, Some(4)),
        ]
    );
}

#[test]
fn test_copy_keeps_source_and_move_removes_it() {
    let (_temp, fm, root) = setup_manager();
    let bytes: Vec<u8> = (0..=255u8).collect();
    fm.upload_write(
        "",
        Some(&Upload {
            original_name: "src.bin".into(),
            bytes: bytes.clone(),
        }),
        Some("src"),
    )
    .unwrap();

    fm.copy_file("src.bin", "dst.bin").unwrap();
    assert_eq!(fs::read(root.join("src.bin")).unwrap(), bytes);
    assert_eq!(fs::read(root.join("dst.bin")).unwrap(), bytes);

    fm.move_file("src.bin", "archive/moved.bin").unwrap();
    assert!(!root.join("src.bin").exists());
    assert_eq!(fs::read(root.join("archive/moved.bin")).unwrap(), bytes);
    assert!(matches!(
        fm.move_file("dst.bin", "archive/moved.bin"),
        Err(StorageError::AlreadyExists(_))
    ));
    assert!(root.join("dst.bin").exists());
}

#[test]
fn test_upload_into_subdirectory_with_desired_name() {
    let (_temp, fm, root) = setup_manager();
    fm.create_folder("docs").unwrap();
    let payload = Upload {
        original_name: "original.pdf".into(),
        bytes: b"%PDF".to_vec(),
    };

    let stored = fm.upload_write("docs", Some(&payload), Some("report")).unwrap();
    assert_eq!(stored.target.relative(), "docs/report.pdf");
    assert_eq!(fs::read(root.join("docs").join("report.pdf")).unwrap(), b"%PDF");
}

// Helpers for the live server tests

async fn start_server() -> (TempDir, SocketAddr) {
    let temp = TempDir::new().unwrap();
    let mut config = ServerConfig::default();
    config.startup.control_port = 0;
    config.startup.storage_root = temp.path().join("storage").to_string_lossy().to_string();
    config.runtime.max_upload_size_mb = 1;

    let server = Server::new(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move { server.start().await });
    (temp, addr)
}

async fn connect(addr: SocketAddr) -> (BufReader<OwnedReadHalf>, OwnedWriteHalf) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let greeting = read_reply(&mut reader).await;
    assert!(greeting.starts_with("220 "), "unexpected greeting {greeting:?}");
    (reader, write_half)
}

async fn read_reply(reader: &mut BufReader<OwnedReadHalf>) -> String {
    let mut line = String::new();
    reader.read_line(&mut line).await.unwrap();
    line
}

async fn send(
    reader: &mut BufReader<OwnedReadHalf>,
    writer: &mut OwnedWriteHalf,
    command: &str,
    payload: &[u8],
) -> String {
    writer.write_all(format!("{command}\r\n").as_bytes()).await.unwrap();
    writer.write_all(payload).await.unwrap();
    writer.flush().await.unwrap();
    read_reply(reader).await
}

async fn read_listing(reader: &mut BufReader<OwnedReadHalf>) -> Vec<String> {
    let mut lines = Vec::new();
    loop {
        let line = read_reply(reader).await;
        let done = line.starts_with("212 ");
        lines.push(line);
        if done {
            return lines;
        }
    }
}

#[tokio::test]
async fn test_session_create_upload_list() {
    let (temp, addr) = start_server().await;
    let (mut reader, mut writer) = connect(addr).await;

    let reply = send(&mut reader, &mut writer, "MKFILE notes/todo.txt\t4", b"milk").await;
    assert_eq!(reply, "250 File created. Current directory: \"notes\"\r\n");

    let reply = send(&mut reader, &mut writer, "UPLOAD notes\tscan.pdf\t3\treceipt", b"PDF").await;
    assert!(reply.starts_with("250 File uploaded."), "{reply:?}");

    writer.write_all(b"LIST\r\n").await.unwrap();
    let listing = read_listing(&mut reader).await;
    assert_eq!(listing[0], "212-crumb\troot\t\r\n");
    assert_eq!(listing[1], "212-crumb\tnotes\tnotes\r\n");
    assert_eq!(listing[2], "212-file\t3\treceipt.pdf\tnotes/receipt.pdf\r\n");
    assert_eq!(listing[3], "212-file\t4\ttodo.txt\tnotes/todo.txt\r\n");
    assert_eq!(listing[4], "212 2 entries\r\n");

    let stored = temp.path().join("storage").join("notes").join("receipt.pdf");
    assert_eq!(fs::read(stored).unwrap(), b"PDF");

    let reply = send(&mut reader, &mut writer, "QUIT", b"").await;
    assert_eq!(reply, "221 Goodbye\r\n");
}

#[tokio::test]
async fn test_session_rejects_traversal_and_collisions() {
    let (_temp, addr) = start_server().await;
    let (mut reader, mut writer) = connect(addr).await;

    let reply = send(&mut reader, &mut writer, "MKDIR ..\\escape", b"").await;
    assert!(reply.starts_with("553 "), "{reply:?}");

    let reply = send(&mut reader, &mut writer, "MKDIR a/b/c", b"").await;
    assert!(reply.starts_with("250 "), "{reply:?}");
    let reply = send(&mut reader, &mut writer, "MKDIR a/b/c", b"").await;
    assert!(reply.starts_with("521 "), "{reply:?}");

    let reply = send(&mut reader, &mut writer, "DEL a/b", b"").await;
    assert!(reply.starts_with("550 Not a file"), "{reply:?}");

    let reply = send(&mut reader, &mut writer, "UPLOAD a", b"").await;
    assert!(reply.starts_with("501 No file uploaded"), "{reply:?}");

    let reply = send(&mut reader, &mut writer, "PWD", b"").await;
    assert_eq!(reply, "257 \"a/b\" is the current directory\r\n");
}

#[tokio::test]
async fn test_session_copy_and_move() {
    let (temp, addr) = start_server().await;
    let root = temp.path().join("storage");
    let (mut reader, mut writer) = connect(addr).await;

    send(&mut reader, &mut writer, "MKFILE src.txt\t5", b"hello").await;
    let reply = send(&mut reader, &mut writer, "COPY src.txt\tcopies/dst.txt", b"").await;
    assert_eq!(reply, "250 File copied. Current directory: \"copies\"\r\n");

    let reply = send(&mut reader, &mut writer, "MOVE src.txt\tmoved.txt", b"").await;
    assert_eq!(reply, "250 File moved. Current directory: \"/\"\r\n");

    assert!(!root.join("src.txt").exists());
    assert_eq!(fs::read(root.join("moved.txt")).unwrap(), b"hello");
    assert_eq!(fs::read(root.join("copies").join("dst.txt")).unwrap(), b"hello");
}

#[tokio::test]
async fn test_oversized_upload_is_refused_before_payload() {
    let (temp, addr) = start_server().await;
    let (mut reader, mut writer) = connect(addr).await;

    let too_big = 1024 * 1024 + 1;
    let reply = send(
        &mut reader,
        &mut writer,
        &format!("UPLOAD \tbig.bin\t{too_big}"),
        b"",
    )
    .await;
    assert!(reply.starts_with("552 "), "{reply:?}");
    assert!(!temp.path().join("storage").join("big.bin").exists());
}
