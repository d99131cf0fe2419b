use anyhow::{Context, Result};
use rosc::{encoder, OscMessage, OscPacket, OscType};
use std::net::UdpSocket;

use crate::anchor::{AssetKind, AssetTransform};
use crate::driver::SceneGraph;

/// 送信先のデフォルトアドレス
pub const OSC_DEFAULT_ADDR: &str = "127.0.0.1:39540";

const ASSET_ADDR: &str = "/tryon/asset";

/// アセット 1 件分の OSC メッセージを構築
/// 引数: name, visible, px, py, pz, sx, sy, sz, qx, qy, qz, qw
pub fn build_osc_message(kind: AssetKind, transform: &AssetTransform) -> OscMessage {
    let mut args = Vec::with_capacity(12);
    args.push(OscType::String(kind.name().to_string()));
    args.push(OscType::Int(i32::from(transform.visible)));
    args.extend(transform.position.iter().map(|&v| OscType::Float(v)));
    args.extend(transform.scale.iter().map(|&v| OscType::Float(v)));
    args.extend(transform.rotation.iter().map(|&v| OscType::Float(v)));
    OscMessage {
        addr: ASSET_ADDR.to_string(),
        args,
    }
}

/// OSCメッセージをバイト列にエンコード
pub fn encode_osc_message(msg: &OscMessage) -> Result<Vec<u8>> {
    let packet = OscPacket::Message(msg.clone());
    let encoded = encoder::encode(&packet)?;
    Ok(encoded)
}

/// 外部レンダラへ姿勢を流すシーングラフ
///
/// 送信失敗はフレームを止めずに数えるだけ
pub struct OscSceneSink {
    socket: UdpSocket,
    target_addr: String,
    send_errors: usize,
}

impl OscSceneSink {
    pub fn new(target_addr: &str) -> Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind OSC socket")?;
        Ok(Self {
            socket,
            target_addr: target_addr.to_string(),
            send_errors: 0,
        })
    }

    pub fn send(&self, kind: AssetKind, transform: &AssetTransform) -> Result<()> {
        let msg = build_osc_message(kind, transform);
        let data = encode_osc_message(&msg)?;
        self.socket.send_to(&data, &self.target_addr)?;
        Ok(())
    }

    pub fn send_errors(&self) -> usize {
        self.send_errors
    }
}

impl SceneGraph for OscSceneSink {
    fn apply(&mut self, kind: AssetKind, transform: &AssetTransform) {
        if let Err(e) = self.send(kind, transform) {
            if self.send_errors == 0 {
                log::warn!("OSC send to {} failed: {}", self.target_addr, e);
            }
            self.send_errors += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_osc_message_address() {
        let msg = build_osc_message(AssetKind::Ring, &AssetTransform::identity());
        assert_eq!(msg.addr, "/tryon/asset");
    }

    #[test]
    fn test_build_osc_message_args() {
        let t = AssetTransform::new([1.0, 2.0, 3.0], [0.5, 0.5, 0.5], [0.0, 0.0, 0.0, 1.0], true);
        let msg = build_osc_message(AssetKind::Glasses, &t);

        // 引数: name, visible, px, py, pz, sx, sy, sz, qx, qy, qz, qw
        assert_eq!(msg.args.len(), 12);
        assert_eq!(msg.args[0], OscType::String("glasses".to_string()));
        assert_eq!(msg.args[1], OscType::Int(1));
        assert_eq!(msg.args[2], OscType::Float(1.0));
        assert_eq!(msg.args[4], OscType::Float(3.0));
        assert_eq!(msg.args[5], OscType::Float(0.5));
        assert_eq!(msg.args[11], OscType::Float(1.0));
    }

    #[test]
    fn test_build_osc_message_hidden() {
        let msg = build_osc_message(AssetKind::Hat, &AssetTransform::identity());
        assert_eq!(msg.args[1], OscType::Int(0));
    }

    #[test]
    fn test_encode_osc_message() {
        let msg = build_osc_message(AssetKind::Watch, &AssetTransform::identity());
        let encoded = encode_osc_message(&msg).unwrap();
        assert!(!encoded.is_empty());
    }

    #[test]
    fn test_sink_sends_to_local_socket() {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = receiver.local_addr().unwrap().to_string();
        let mut sink = OscSceneSink::new(&addr).unwrap();
        sink.apply(AssetKind::Lips, &AssetTransform::identity());
        assert_eq!(sink.send_errors(), 0);

        let mut buf = [0u8; 512];
        let (len, _) = receiver.recv_from(&mut buf).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&buf[..len]).unwrap();
        match packet {
            OscPacket::Message(msg) => assert_eq!(msg.args[0], OscType::String("lips".to_string())),
            _ => panic!("expected message"),
        }
    }
}
