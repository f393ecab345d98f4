// Copyright 2024 Dmitry Tantsur <dtantsur@protonmail.com>
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use oscloud::loadbalancer::LoadBalancers;

#[tokio::main]
async fn main() {
    env_logger::init();

    let session = oscloud::Session::from_env()
        .await
        .expect("Failed to create an identity provider from the environment");
    let lbs = LoadBalancers::new(&session);

    let algorithms = lbs
        .list_algorithms()
        .await
        .expect("Failed to list algorithms");
    println!("Supported algorithms: {:?}", algorithms);

    let all = lbs
        .list_load_balancers(None, None)
        .await
        .expect("Failed to list load balancers")
        .all_pages()
        .await
        .expect("Failed to fetch the next page");
    for lb in all {
        println!(
            "ID = {}, Name = {}, Protocol = {}, Port = {}, State = {}",
            lb.id, lb.name, lb.protocol, lb.port, lb.status
        );
        for vip in lb.virtual_ips {
            println!("  {} ({}, {})", vip.address, vip.vip_type, vip.ip_version);
        }
    }
}
