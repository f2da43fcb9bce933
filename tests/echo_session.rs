use std::{
    net::{SocketAddr, TcpListener},
    thread,
    time::Duration,
};

use tunequery::{
    ClientConfig, ClientError, QueryClient, SearchChannel,
    protocol::{
        EchoServer, FrameDecoder, FrameEncoder, ProtocolTransport, QueryRequest, RequestDecoder,
        RequestEncoder, ResponseDecoder, ResponseEncoder, echo,
    },
};

fn spawn_echo_server() -> SocketAddr {
    let server = EchoServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), 2).unwrap();
    let address = server.local_addr().unwrap();
    thread::spawn(move || server.listen().unwrap());
    address
}

fn config(address: SocketAddr) -> ClientConfig {
    ClientConfig {
        address,
        response_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    }
}

#[test]
fn hello_then_bye_over_tcp() {
    let address = spawn_echo_server();
    let mut output: Vec<u8> = Vec::new();

    let answered = QueryClient::run(&config(address), &b"hello\nbye\n"[..], &mut output).unwrap();

    assert_eq!(answered, 2);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "hello  ->  doSearch -> ECHO:hello\nbye  ->  doSearch -> ECHO:bye\n"
    );
}

#[test]
fn closed_input_sends_nothing() {
    let address = spawn_echo_server();
    let mut output: Vec<u8> = Vec::new();

    let answered = QueryClient::run(&config(address), &b""[..], &mut output).unwrap();

    assert_eq!(answered, 0);
    assert!(output.is_empty());
}

#[test]
fn custom_pipeline_session() {
    let address = spawn_echo_server();
    let mut session = QueryClient::connect(&config(address), |p| {
        p.request_encoder(RequestEncoder::default())?
            .frame_decoder(FrameDecoder::default())?
            .response_decoder(ResponseDecoder::default())?;
        Ok(())
    })
    .unwrap();

    let resp = session.do_search(QueryRequest::song("Bye")).unwrap();
    assert_eq!(resp.to_string(), "ECHO:Bye");
    session.wait_closed().unwrap();
}

#[test]
fn pipeline_out_of_order_is_rejected() {
    let address = spawn_echo_server();

    let result = QueryClient::connect(&config(address), |p| {
        p.response_decoder(ResponseDecoder::default())?;
        Ok(())
    });

    assert!(matches!(result, Err(ClientError::Pipeline(_))));
}

#[test]
fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        thread::sleep(Duration::from_millis(500));
        drop(stream);
    });

    let config = ClientConfig {
        address,
        response_timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let err = QueryClient::run(&config, &b"hello\n"[..], Vec::<u8>::new()).unwrap_err();

    assert!(matches!(err, ClientError::Submission(_)));
    handle.join().unwrap();
}

#[test]
fn slow_close_after_bye_outlasts_response_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut transport = ProtocolTransport::new(
            stream.try_clone().unwrap(),
            stream,
            FrameDecoder::default(),
            FrameEncoder::default(),
        );
        let req = transport.receive(&mut RequestDecoder).unwrap().unwrap();
        transport.send(&mut ResponseEncoder, &echo(&req)).unwrap();
        thread::sleep(Duration::from_millis(300));
    });

    let config = ClientConfig {
        address,
        response_timeout: Some(Duration::from_millis(50)),
        ..Default::default()
    };
    let mut output: Vec<u8> = Vec::new();
    let answered = QueryClient::run(&config, &b"bye\n"[..], &mut output).unwrap();

    assert_eq!(answered, 1);
    assert_eq!(
        String::from_utf8(output).unwrap(),
        "bye  ->  doSearch -> ECHO:bye\n"
    );
    handle.join().unwrap();
}
